//! Parser implementation for building the Abstract Syntax Tree.
//!
//! This module contains the main Parser struct, the `TokenRange` interval
//! every parsing function works on, and the scanning helpers used to find
//! where a construct ends before it is parsed.
//!
//! Parsing is recursive descent over sub-ranges of the flat token buffer:
//! a caller first locates the end of a construct (a matching bracket, the
//! next `;`, the end of a primary) and then hands exactly that range to the
//! function that parses it.

use tracing::debug;

use crate::{
    ast::ast::TranslationUnit,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Span,
};

use super::stmt::{parse_extern, parse_function};

/// A half-open interval `[start, end)` of token indices.
///
/// Ranges are only created through [`Parser::range`], which keeps
/// `start <= end <= tokens.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRange {
    start: usize,
    end: usize,
}

impl TokenRange {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The main parser structure.
///
/// Holds the token buffer of one translation unit. All parsing functions
/// borrow it immutably; positions are threaded through explicitly.
pub struct Parser {
    /// The list of tokens to parse
    tokens: Vec<Token>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Builds a range, clamping both ends into the buffer so that
    /// `start <= end <= len` always holds.
    pub fn range(&self, start: usize, end: usize) -> TokenRange {
        let end = end.min(self.tokens.len());
        TokenRange {
            start: start.min(end),
            end,
        }
    }

    pub fn full_range(&self) -> TokenRange {
        self.range(0, self.tokens.len())
    }

    pub fn token(&self, p: usize) -> Option<&Token> {
        self.tokens.get(p)
    }

    /// True if the token at `p` exists, lies before `bound` and has `kind`.
    pub fn peek(&self, kind: TokenKind, p: usize, bound: usize) -> bool {
        p < bound && self.tokens.get(p).is_some_and(|token| token.is(kind))
    }

    /// Span used to report an error at `p`.
    ///
    /// Positions past the buffer report the last token.
    pub fn span_at(&self, p: usize) -> Span {
        self.tokens
            .get(p)
            .or_else(|| self.tokens.last())
            .map(|token| token.span)
            .unwrap_or_default()
    }

    /// Human readable description of the token at `p`, for diagnostics.
    pub fn describe(&self, p: usize) -> String {
        match self.tokens.get(p) {
            Some(token) => token.kind.to_string(),
            None => String::from("end of input"),
        }
    }

    /// Consumes a token of the expected kind at `p`, advancing `p`.
    ///
    /// # Arguments
    ///
    /// * `kind` - The expected TokenKind
    /// * `p` - Current position, advanced by one on success
    /// * `bound` - Exclusive upper limit of the enclosing range
    ///
    /// # Returns
    ///
    /// The consumed token, or an error naming the expected and found kinds.
    pub fn consume_expect(
        &self,
        kind: TokenKind,
        p: &mut usize,
        bound: usize,
    ) -> Result<&Token, Error> {
        if *p >= bound {
            return match self.tokens.get(*p) {
                Some(found) => Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        expected: kind,
                        found: found.kind,
                    },
                    found.span,
                )),
                None => Err(Error::new(
                    ErrorImpl::UnexpectedEnd { expected: kind },
                    self.span_at(*p),
                )),
            };
        }

        let token = &self.tokens[*p];
        if !token.is(kind) {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    expected: kind,
                    found: token.kind,
                },
                token.span,
            ));
        }

        *p += 1;
        Ok(token)
    }

    /// Index of the first token of `kind` inside `range`.
    pub fn find_next(&self, kind: TokenKind, range: TokenRange) -> Option<usize> {
        (range.start..range.end).find(|&p| self.tokens[p].is(kind))
    }

    /// Finds the bracket closing the one at `open`.
    ///
    /// Counts nesting depth of the opener's kind until it returns to zero.
    /// Returns `None` if `open` is not an opening bracket or `bound` is
    /// reached first; the result is always below `bound`.
    pub fn find_matching_bracket(&self, open: usize, bound: usize) -> Option<usize> {
        let opening = self.tokens.get(open)?.kind;
        let closing = opening.closing()?;
        let bound = bound.min(self.tokens.len());

        let mut depth = 0usize;
        for p in open..bound {
            let kind = self.tokens[p].kind;
            if kind == opening {
                depth += 1;
            } else if kind == closing {
                depth -= 1;
            }
            if depth == 0 {
                return Some(p);
            }
        }
        None
    }

    /// Finds the end of the primary expression starting the range.
    ///
    /// A parenthesised group or a call ends after its matching `)`;
    /// anything else is the maximal run of identifiers and numbers, which
    /// is empty when the range starts with some other token.
    pub fn find_primary_end(&self, range: TokenRange) -> Option<usize> {
        let start = range.start;
        let end = range.end;

        if self.peek(TokenKind::OpenParen, start, end) {
            return self.find_matching_bracket(start, end).map(|close| close + 1);
        }
        if self.peek(TokenKind::Identifier, start, end)
            && self.peek(TokenKind::OpenParen, start + 1, end)
        {
            return self
                .find_matching_bracket(start + 1, end)
                .map(|close| close + 1);
        }

        let mut p = start;
        while self.peek(TokenKind::Identifier, p, end) || self.peek(TokenKind::Number, p, end) {
            p += 1;
        }
        Some(p)
    }

    /// Finds the end of an expression: primaries joined by binary operators.
    ///
    /// Used to split call arguments, where the expression ends at the first
    /// token that is neither part of a primary nor an operator.
    pub fn find_expr_end(&self, range: TokenRange) -> Option<usize> {
        let mut p = range.start;
        while p < range.end {
            p = self.find_primary_end(self.range(p, range.end))?;
            if self.consume_expect(TokenKind::BinaryOp, &mut p, range.end).is_err() {
                break;
            }
        }
        Some(p)
    }
}

/// Parses a whole translation unit.
///
/// The top level is a sequence of `extern` declarations and function
/// definitions; anything else is reported as a missing `fn`.
pub fn parse(tokens: Vec<Token>) -> Result<TranslationUnit, Error> {
    let parser = Parser::new(tokens);
    let mut unit = TranslationUnit::default();
    let mut p = 0;

    while p < parser.len() {
        if parser.peek(TokenKind::Extern, p, parser.len()) {
            let (signature, end) = parse_extern(&parser, p)?;
            debug!(name = %signature.name, "parsed extern declaration");
            unit.externs.push(signature);
            p = end;
            continue;
        }

        if !parser.peek(TokenKind::Fn, p, parser.len()) {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    expected: TokenKind::Fn,
                    found: parser.tokens[p].kind,
                },
                parser.span_at(p),
            ));
        }

        let (function, end) = parse_function(&parser, p)?;
        debug!(name = %function.signature.name, "parsed function");
        unit.functions.push(function);
        p = end;
    }

    Ok(unit)
}
