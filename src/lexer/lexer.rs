use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &Regex);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    // Order matters: the first pattern matching at the current column wins,
    // so two-character operators come before their one-character prefixes.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new("^[ \t\r]+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^#.*").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*").unwrap(), handler: symbol_handler },
        RegexPattern { regex: Regex::new("^[0-9]+").unwrap(), handler: number_handler },
        RegexPattern { regex: Regex::new("^;").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";") },
        RegexPattern { regex: Regex::new("^\\(").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(") },
        RegexPattern { regex: Regex::new("^\\)").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")") },
        RegexPattern { regex: Regex::new("^\\{").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{") },
        RegexPattern { regex: Regex::new("^\\}").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}") },
        RegexPattern { regex: Regex::new("^,").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
        RegexPattern { regex: Regex::new("^->").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Arrow, "->") },
        RegexPattern { regex: Regex::new("^-").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::BinaryOp, "-") },
        RegexPattern { regex: Regex::new("^\\+").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::BinaryOp, "+") },
        RegexPattern { regex: Regex::new("^\\*").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::BinaryOp, "*") },
        RegexPattern { regex: Regex::new("^/").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::BinaryOp, "/") },
        RegexPattern { regex: Regex::new("^\\|").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::BinaryOp, "|") },
        RegexPattern { regex: Regex::new("^\\.").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::BinaryOp, ".") },
        RegexPattern { regex: Regex::new("^==").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::BinaryOp, "==") },
        RegexPattern { regex: Regex::new("^=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Assign, "=") },
        RegexPattern { regex: Regex::new("^!=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::BinaryOp, "!=") },
    ];
}

/// Scanning state for one source line.
pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    line: u32,
    pos: usize,
}

impl Lexer {
    pub fn new(tokens: Vec<Token>, source: &str, line: u32) -> Lexer {
        Lexer {
            tokens,
            source: source.to_string(),
            line,
            pos: 0,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eol(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Span of the next `len` bytes starting at the current column.
    pub fn span_of(&self, len: usize) -> Span {
        Span::new(self.line, self.pos as u32, (self.pos + len) as u32)
    }

    fn matched_len(&self, regex: &Regex) -> usize {
        regex.find(self.remainder()).map_or(0, |m| m.end())
    }
}

fn skip_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = lexer.matched_len(regex);
    lexer.advance_n(len);
}

fn number_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = lexer.matched_len(regex);
    let value = lexer.remainder()[..len].to_string();

    lexer.push(MK_TOKEN!(TokenKind::Number, value, lexer.span_of(len)));
    lexer.advance_n(len);
}

fn symbol_handler(lexer: &mut Lexer, regex: &Regex) {
    let len = lexer.matched_len(regex);
    let value = lexer.remainder()[..len].to_string();
    let kind = RESERVED_LOOKUP
        .get(value.as_str())
        .copied()
        .unwrap_or(TokenKind::Identifier);

    lexer.push(MK_TOKEN!(kind, value, lexer.span_of(len)));
    lexer.advance_n(len);
}

/// Converts source text into tokens, line by line.
///
/// The first unrecognised character aborts the whole call.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = vec![];

    for (index, line) in source.lines().enumerate() {
        let mut lex = Lexer::new(tokens, line, index as u32 + 1);

        while !lex.at_eol() {
            let pattern = PATTERNS
                .iter()
                .find(|pattern| pattern.regex.is_match(lex.remainder()));

            match pattern {
                Some(pattern) => (pattern.handler)(&mut lex, &pattern.regex),
                None => {
                    let character = lex.remainder().chars().next().unwrap_or_default();
                    return Err(Error::new(
                        ErrorImpl::UnrecognisedCharacter { character },
                        lex.span_of(1),
                    ));
                }
            }
        }

        tokens = lex.tokens;
    }

    debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}
