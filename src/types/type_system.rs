//! Type System for UL
//!
//! A closed set of primitive kinds plus fixed-size arrays of a primitive
//! kind. Equality is structural.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    Void,
    Boolean,
    Integer,
    Float,
    Character,
    String,
}

impl PrimitiveType {
    /// Source-level spelling
    pub fn name(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Boolean => "boolean",
            Self::Integer => "int",
            Self::Float => "float",
            Self::Character => "char",
            Self::String => "string",
        }
    }

    /// Single-letter code used in the IR text format
    pub fn ir_code(&self) -> char {
        match self {
            Self::Void => 'V',
            Self::Boolean => 'Z',
            Self::Integer => 'I',
            Self::Float => 'F',
            Self::Character => 'C',
            Self::String => 'U',
        }
    }

    /// JVM field descriptor
    pub fn jasmin_descriptor(&self) -> &'static str {
        match self {
            Self::Void => "V",
            Self::Boolean => "Z",
            Self::Integer => "I",
            Self::Float => "F",
            Self::Character => "C",
            Self::String => "Ljava/lang/String;",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A UL type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveType),
    Array { size: u32, element: PrimitiveType },
}

impl Type {
    // Constants for the primitive types
    pub const VOID: Self = Self::Primitive(PrimitiveType::Void);
    pub const BOOLEAN: Self = Self::Primitive(PrimitiveType::Boolean);
    pub const INT: Self = Self::Primitive(PrimitiveType::Integer);
    pub const FLOAT: Self = Self::Primitive(PrimitiveType::Float);
    pub const CHAR: Self = Self::Primitive(PrimitiveType::Character);
    pub const STRING: Self = Self::Primitive(PrimitiveType::String);

    /// Create an array type
    pub fn array(element: PrimitiveType, size: u32) -> Self {
        Self::Array { size, element }
    }

    pub fn is_void(&self) -> bool {
        *self == Self::VOID
    }

    pub fn is_boolean(&self) -> bool {
        *self == Self::BOOLEAN
    }

    pub fn is_int(&self) -> bool {
        *self == Self::INT
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array { .. })
    }

    /// Element type of an array type
    pub fn element(&self) -> Option<Type> {
        match self {
            Self::Array { element, .. } => Some(Self::Primitive(*element)),
            Self::Primitive(_) => None,
        }
    }

    /// Whether values of this type can be printed
    pub fn is_printable(&self) -> bool {
        !self.is_void() && !self.is_array()
    }

    /// Type code used in the IR text format
    pub fn ir_string(&self) -> String {
        match self {
            Self::Primitive(p) => p.ir_code().to_string(),
            Self::Array { element, .. } => format!("[{}", element.ir_code()),
        }
    }

    /// JVM field descriptor
    pub fn jasmin_descriptor(&self) -> String {
        match self {
            Self::Primitive(p) => p.jasmin_descriptor().to_string(),
            Self::Array { element, .. } => format!("[{}", element.jasmin_descriptor()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{}", p),
            Self::Array { size, element } => write!(f, "{}[{}]", element, size),
        }
    }
}

/// Ordered argument types plus a return type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MethodType {
    pub params: Vec<Type>,
    pub ret: Type,
}

impl Default for Type {
    fn default() -> Self {
        Self::VOID
    }
}

impl MethodType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        Self { params, ret }
    }

    /// `(II)I` style signature used by the IR text format
    pub fn ir_string(&self) -> String {
        let params: String = self.params.iter().map(Type::ir_string).collect();
        format!("({}){}", params, self.ret.ir_string())
    }

    /// JVM method descriptor
    pub fn jasmin_descriptor(&self) -> String {
        let params: String = self.params.iter().map(Type::jasmin_descriptor).collect();
        format!("({}){}", params, self.ret.jasmin_descriptor())
    }
}
