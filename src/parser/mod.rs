//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! This module contains the parser that transforms a stream of tokens
//! into an Abstract Syntax Tree. It is a recursive descent parser over
//! ranges of the token buffer and handles:
//!
//! - Top level `fn` definitions and `extern` declarations
//! - Bodies: declarations, assignments, expressions and `if` constructs
//! - Expressions: primaries, calls and binary operators ordered by a
//!   priority table
//!
//! The first error aborts parsing; there is no recovery.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
