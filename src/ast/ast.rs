use crate::Span;

use super::{
    expressions::{BinaryOp, Call, NumberLiteral, VariableRef},
    statements::{Assign, Declare, If},
};

/// Node Types
///
/// Every construct that may appear inside a body. Lowering matches on this
/// enum exhaustively, so a new kind cannot be added without handling it.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(NumberLiteral),
    Variable(VariableRef),
    Binary(BinaryOp),
    Call(Call),
    Assign(Assign),
    Declare(Declare),
    If(If),
}

impl Node {
    /// Returns the span of the token the node originated from.
    pub fn span(&self) -> Span {
        match self {
            Node::Number(node) => node.span,
            Node::Variable(node) => node.span,
            Node::Binary(node) => node.span,
            Node::Call(node) => node.span,
            Node::Assign(node) => node.span,
            Node::Declare(node) => node.span,
            Node::If(node) => node.span,
        }
    }
}

/// A sequence of statements optionally followed by a tail expression,
/// the value of the body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub statements: Vec<Node>,
    pub tail: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub type_name: String,
    pub name: String,
    pub span: Span,
}

/// Function prototype shared by definitions and `extern` declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub return_type: String,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub signature: Signature,
    pub body: Body,
}

/// Everything parsed from one source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslationUnit {
    pub functions: Vec<Function>,
    pub externs: Vec<Signature>,
}
