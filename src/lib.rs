#![allow(clippy::module_inception)]

use std::fmt::Display;

use inkwell::context::Context;

use crate::{
    compiler::compiler::{compile, CompileOptions, Compiler},
    errors::errors::{Error, ErrorTip},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

pub mod ast;
pub mod compiler;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;

extern crate regex;

/// Source location of a token or node: a 1-based line and a half-open
/// range of 0-based columns within that line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(line: u32, start: u32, end: u32) -> Self {
        Span { line, start, end }
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}:{}-{})", self.line, self.start, self.end)
    }
}

/// Runs the whole front end over one translation unit.
///
/// Lexing, parsing and lowering stop at the first error. On success the
/// returned compiler owns a verified module ready for emission.
pub fn compile_source<'a>(
    source: &str,
    module_name: &str,
    context: &'a Context,
    options: &CompileOptions,
) -> Result<Compiler<'a>, Error> {
    let tokens = tokenize(source)?;
    let unit = parse(tokens)?;
    compile(&unit, context, module_name, options)
}

pub fn get_line(source: &str, line: u32) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source.lines().nth(line as usize - 1)
}

/// Formats an error together with the offending source line.
///
/// ```text
/// Error: codegen error in function `f` at (2:4-5): undefined variable "y"
///   |
/// 2 |     y + 1
///   |     ^
/// ```
pub fn render_error(error: &Error, source: &str) -> String {
    let span = error.get_span();
    let mut rendered = match error.get_tip() {
        ErrorTip::None => format!("Error: {}\n", error),
        tip => format!("Error: {} ({})\n", error, tip),
    };

    let Some(line_text) = get_line(source, span.line) else {
        return rendered;
    };

    let line_string = span.line.to_string();
    let padding = line_string.len() + 2;
    let underline = (span.end.saturating_sub(span.start)).max(1) as usize;

    rendered.push_str(&format!("{:>padding$}\n", "|"));
    rendered.push_str(&format!("{} | {}\n", line_string, line_text.trim_end()));
    rendered.push_str(&format!(
        "{:>padding$} {}{}\n",
        "|",
        " ".repeat(span.start as usize),
        "^".repeat(underline)
    ));

    rendered
}
