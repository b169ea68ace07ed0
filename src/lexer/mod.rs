//! Lexical analysis module for the compiler.
//!
//! This module contains the lexer (tokenizer) that converts source code
//! into a stream of tokens for parsing. It handles:
//!
//! - Line-by-line tokenization using an ordered table of anchored regex patterns
//! - Recognition of keywords, identifiers, numbers, and operators
//! - Line and column tracking for error reporting
//! - `#` comments and whitespace handling

pub mod lexer;
pub mod tokens;
