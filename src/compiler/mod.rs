//! Code generation module for the compiler.
//!
//! This module contains the LLVM-based code generator that lowers the
//! syntax tree into LLVM IR. It handles:
//!
//! - Function prototypes, bodies and the verifier
//! - Expressions, calls and integer conversions
//! - Declarations, assignments and if/elif/else control flow
//! - The per-function scope stack

pub mod compiler;
pub mod expr;
pub mod scope;
pub mod stmt;

#[cfg(test)]
mod tests;
