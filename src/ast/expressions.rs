use crate::Span;

use super::ast::Node;

// LITERALS

/// Number Expression
/// Keeps the literal text; it is converted to an integer during lowering.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub value: String,
    pub span: Span,
}

/// Symbol Expression
/// A read of a binding or variable by name.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    pub name: String,
    pub span: Span,
}

// COMPLEX

/// Binary Expression
/// The span is the operator's.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub operator: String,
    pub left: Box<Node>,
    pub right: Box<Node>,
    pub span: Span,
}

/// Call Expression
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: String,
    pub arguments: Vec<Node>,
    pub span: Span,
}
