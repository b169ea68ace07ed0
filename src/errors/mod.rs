//! Error types and error handling for the compiler.
//!
//! This module defines the single error type shared by the lexer, the
//! parser and the code generator. It includes:
//!
//! - Error structures carrying a source span and, for codegen, a function name
//! - Specific error variants for every compilation phase
//! - Error formatting and display functionality
//! - Helpful error messages and suggestions

pub mod errors;
