use std::fmt::Display;

use thiserror::Error;

use crate::{lexer::tokens::TokenKind, Span};

/// The compilation stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lexer,
    Parser,
    Codegen,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Lexer => write!(f, "lexer"),
            Phase::Parser => write!(f, "parser"),
            Phase::Codegen => write!(f, "codegen"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    span: Span,
    function: Option<String>,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, span: Span) -> Self {
        Error {
            internal_error: error_impl,
            span,
            function: None,
        }
    }

    /// Attaches the name of the function being lowered when the error occurred.
    pub fn in_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }

    pub fn get_function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    pub fn get_kind(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_phase(&self) -> Phase {
        match &self.internal_error {
            ErrorImpl::UnrecognisedCharacter { .. } => Phase::Lexer,
            ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::UnexpectedEnd { .. }
            | ErrorImpl::UnmatchedBracket { .. }
            | ErrorImpl::InvalidPrimaryExpression { .. }
            | ErrorImpl::ExpectedCallExpression
            | ErrorImpl::ExpectedDeclarationEnd
            | ErrorImpl::ExpectedExternTerminator => Phase::Parser,
            _ => Phase::Codegen,
        }
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedCharacter { .. } => "UnrecognisedCharacter",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedEnd { .. } => "UnexpectedEnd",
            ErrorImpl::UnmatchedBracket { .. } => "UnmatchedBracket",
            ErrorImpl::InvalidPrimaryExpression { .. } => "InvalidPrimaryExpression",
            ErrorImpl::ExpectedCallExpression => "ExpectedCallExpression",
            ErrorImpl::ExpectedDeclarationEnd => "ExpectedDeclarationEnd",
            ErrorImpl::ExpectedExternTerminator => "ExpectedExternTerminator",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::ImmutableAssignment { .. } => "ImmutableAssignment",
            ErrorImpl::RepeatedArgument { .. } => "RepeatedArgument",
            ErrorImpl::FunctionNotDeclared { .. } => "FunctionNotDeclared",
            ErrorImpl::FunctionAlreadyDeclared { .. } => "FunctionAlreadyDeclared",
            ErrorImpl::ArgumentCountMismatch { .. } => "ArgumentCountMismatch",
            ErrorImpl::UnknownType { .. } => "UnknownType",
            ErrorImpl::MissingInitializer { .. } => "MissingInitializer",
            ErrorImpl::NoDefaultReturnValue { .. } => "NoDefaultReturnValue",
            ErrorImpl::UnsupportedOperator { .. } => "UnsupportedOperator",
            ErrorImpl::ExpectedValue => "ExpectedValue",
            ErrorImpl::VerificationFailed { .. } => "VerificationFailed",
            ErrorImpl::Backend { .. } => "Backend",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnexpectedToken {
                expected: TokenKind::Semicolon,
                ..
            } => ErrorTip::Suggestion(String::from("did you miss a semicolon?")),
            ErrorImpl::UnmatchedBracket { .. } => {
                ErrorTip::Suggestion(String::from("check that every bracket is closed"))
            }
            ErrorImpl::ExpectedCallExpression => ErrorTip::Suggestion(String::from(
                "two adjacent names are only valid as a declaration such as `i32 x = 1`",
            )),
            ErrorImpl::UnknownType { .. } => {
                ErrorTip::Suggestion(String::from("known types are `i32`, `u8` and `void`"))
            }
            ErrorImpl::MissingInitializer { variable } => ErrorTip::Suggestion(format!(
                "give `{}` a value or declare it with `mut`",
                variable
            )),
            ErrorImpl::ImmutableAssignment { variable } => ErrorTip::Suggestion(format!(
                "declare `{}` with `mut` to allow assignment",
                variable
            )),
            ErrorImpl::NoDefaultReturnValue { .. } => ErrorTip::Suggestion(String::from(
                "end the function body with an expression and no trailing semicolon",
            )),
            ErrorImpl::VariableNotDeclared { .. } => ErrorTip::Suggestion(String::from(
                "variables of enclosing scopes are not visible here",
            )),
            ErrorImpl::VerificationFailed { .. } => ErrorTip::Suggestion(String::from(
                "bindings declared inside an `if` branch can only be used in that branch",
            )),
            _ => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.function {
            Some(function) => write!(
                f,
                "{} error in function `{}` at {}: {}",
                self.get_phase(),
                function,
                self.span,
                self.internal_error
            ),
            None => write!(
                f,
                "{} error at {}: {}",
                self.get_phase(),
                self.span,
                self.internal_error
            ),
        }
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised character {character:?}")]
    UnrecognisedCharacter { character: char },
    #[error("expected {expected} but {found} was found")]
    UnexpectedToken { expected: TokenKind, found: TokenKind },
    #[error("expected {expected} but the input ended")]
    UnexpectedEnd { expected: TokenKind },
    #[error("no matching {expected} for this {opening}")]
    UnmatchedBracket { opening: TokenKind, expected: TokenKind },
    #[error("expected a primary expression but {found} was found")]
    InvalidPrimaryExpression { found: String },
    #[error("expected a call expression")]
    ExpectedCallExpression,
    #[error("expected a ; at the end of declaration")]
    ExpectedDeclarationEnd,
    #[error("expected a ; at the end of extern declaration")]
    ExpectedExternTerminator,
    #[error("cannot cast {token:?} to a 32-bit integer")]
    NumberParseError { token: String },
    #[error("variable {variable:?} already exists in this scope")]
    VariableAlreadyDeclared { variable: String },
    #[error("undefined variable {variable:?}")]
    VariableNotDeclared { variable: String },
    #[error("cannot assign to immutable binding {variable:?}")]
    ImmutableAssignment { variable: String },
    #[error("repeated function argument {argument:?}")]
    RepeatedArgument { argument: String },
    #[error("function {function:?}'s definition is not found")]
    FunctionNotDeclared { function: String },
    #[error("function {function:?} already declared")]
    FunctionAlreadyDeclared { function: String },
    #[error("function call expects {expected} arguments but {received} were found")]
    ArgumentCountMismatch { expected: usize, received: usize },
    #[error("undefined type {type_}")]
    UnknownType { type_: String },
    #[error("expected a value for immutable binding {variable:?}")]
    MissingInitializer { variable: String },
    #[error("return type {type_} has no default value so a return value must be specified")]
    NoDefaultReturnValue { type_: String },
    #[error("unsupported operator {operator:?}")]
    UnsupportedOperator { operator: String },
    #[error("expression does not produce a value")]
    ExpectedValue,
    #[error("function failed verification: {message}")]
    VerificationFailed { message: String },
    #[error("backend failure: {message}")]
    Backend { message: String },
}
