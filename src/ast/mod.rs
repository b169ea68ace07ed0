/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: The `Node` sum type and the structural records (bodies, functions, units)
/// - expressions: Definitions for the value-producing node kinds
/// - statements: Definitions for bindings, assignment and conditionals
/// - types: The closed set of primitive types named in source
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
