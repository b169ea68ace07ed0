//! Lexical scope frames used during lowering.

use std::collections::HashMap;

use inkwell::{
    types::IntType,
    values::{BasicValueEnum, FunctionValue, PointerValue},
};

/// Name of the bottom frame, which belongs to no function.
pub const GLOBAL_SCOPE: &str = "__global";

/// Stack slot of a `mut` variable together with the type stored in it.
#[derive(Debug, Clone, Copy)]
pub struct Variable<'a> {
    pub pointer: PointerValue<'a>,
    pub ty: IntType<'a>,
}

/// One frame of the scope stack.
///
/// A name lives in at most one of the two maps: immutable bindings hold
/// their value directly, mutable variables hold their stack slot.
#[derive(Debug)]
pub struct Scope<'a> {
    pub function: String,
    pub function_value: Option<FunctionValue<'a>>,
    values: HashMap<String, BasicValueEnum<'a>>,
    variables: HashMap<String, Variable<'a>>,
}

impl<'a> Scope<'a> {
    pub fn global() -> Self {
        Scope {
            function: String::from(GLOBAL_SCOPE),
            function_value: None,
            values: HashMap::new(),
            variables: HashMap::new(),
        }
    }

    pub fn new(function: &str, function_value: FunctionValue<'a>) -> Self {
        Scope {
            function: function.to_string(),
            function_value: Some(function_value),
            values: HashMap::new(),
            variables: HashMap::new(),
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.variables.contains_key(name)
    }

    /// Binds an immutable value. Returns false if the name is taken.
    pub fn insert_value(&mut self, name: &str, value: BasicValueEnum<'a>) -> bool {
        if self.is_declared(name) {
            return false;
        }
        self.values.insert(name.to_string(), value);
        true
    }

    /// Registers a mutable variable. Returns false if the name is taken.
    pub fn insert_variable(&mut self, name: &str, variable: Variable<'a>) -> bool {
        if self.is_declared(name) {
            return false;
        }
        self.variables.insert(name.to_string(), variable);
        true
    }

    pub fn value(&self, name: &str) -> Option<BasicValueEnum<'a>> {
        self.values.get(name).copied()
    }

    pub fn variable(&self, name: &str) -> Option<Variable<'a>> {
        self.variables.get(name).copied()
    }
}
