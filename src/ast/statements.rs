use crate::Span;

use super::ast::{Body, Node};

/// Assignment Statement
/// Stores a new value into a `mut` variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: String,
    pub value: Box<Node>,
    pub span: Span,
}

/// Variable Declaration Statement
///
/// `[mut] type name [= initializer]`. Immutable declarations require an
/// initializer; that is checked during lowering.
#[derive(Debug, Clone, PartialEq)]
pub struct Declare {
    pub mutable: bool,
    pub type_name: String,
    pub name: String,
    pub initializer: Option<Box<Node>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElifBranch {
    pub condition: Node,
    pub body: Body,
}

/// If Statement
/// Branches are tested in order: the `if` condition, then each `elif`.
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Box<Node>,
    pub then_body: Body,
    pub elifs: Vec<ElifBranch>,
    pub else_body: Option<Body>,
    pub span: Span,
}
