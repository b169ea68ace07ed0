use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("mut", TokenKind::Mut);
        map.insert("fn", TokenKind::Fn);
        map.insert("if", TokenKind::If);
        map.insert("else", TokenKind::Else);
        map.insert("elif", TokenKind::Elif);
        map.insert("extern", TokenKind::Extern);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    Number,
    Identifier,

    Semicolon,
    OpenParen,
    CloseParen,
    OpenCurly,
    CloseCurly,
    Comma,

    BinaryOp, // + - * / | . == !=
    Arrow,    // ->
    Assign,   // =

    // Reserved
    Mut,
    Fn,
    If,
    Else,
    Elif,
    Extern,
}

impl TokenKind {
    /// Returns the closing bracket for an opening one.
    pub fn closing(&self) -> Option<TokenKind> {
        match self {
            TokenKind::OpenParen => Some(TokenKind::CloseParen),
            TokenKind::OpenCurly => Some(TokenKind::CloseCurly),
            _ => None,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Number => "number",
            TokenKind::Identifier => "identifier",
            TokenKind::Semicolon => "`;`",
            TokenKind::OpenParen => "`(`",
            TokenKind::CloseParen => "`)`",
            TokenKind::OpenCurly => "`{`",
            TokenKind::CloseCurly => "`}`",
            TokenKind::Comma => "`,`",
            TokenKind::BinaryOp => "binary operator",
            TokenKind::Arrow => "`->`",
            TokenKind::Assign => "`=`",
            TokenKind::Mut => "`mut`",
            TokenKind::Fn => "`fn`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::Elif => "`elif`",
            TokenKind::Extern => "`extern`",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "type:{:<20}value:{{{}}}\tat {}",
            format!("{:?}", self.kind),
            self.value,
            self.span
        )
    }
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
