//! Primitive types named in source.
//!
//! Types appear in the tree as the names the programmer wrote. They are
//! resolved to a `PrimitiveType` during lowering, where an unknown name
//! becomes an error.

use std::fmt::Display;

/// The closed set of types the language knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `i32`
    Int32,
    /// Spelled `u8` in source but 64 bits wide.
    WideInt,
    /// `void`
    Void,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        match name {
            "i32" => Some(PrimitiveType::Int32),
            "u8" => Some(PrimitiveType::WideInt),
            "void" => Some(PrimitiveType::Void),
            _ => None,
        }
    }

    /// Source spelling of the type.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Int32 => "i32",
            PrimitiveType::WideInt => "u8",
            PrimitiveType::Void => "void",
        }
    }

    /// Bit width of values of this type, `None` for `void`.
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            PrimitiveType::Int32 => Some(32),
            PrimitiveType::WideInt => Some(64),
            PrimitiveType::Void => None,
        }
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
