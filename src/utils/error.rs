//! Error handling for the UL compiler

use crate::types::Type;
use crate::utils::Span;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler error
///
/// Every variant here is caused by the input program or by the environment.
/// Broken compiler invariants panic instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Semantic Errors ====================

    #[error("Expected type '{expected}' but found type '{found}'")]
    TypeMismatch {
        expected: Type,
        found: Type,
        span: Option<Span>,
    },

    #[error("Cannot apply {op} operator to type '{ty}'")]
    InvalidOperandType {
        op: String,
        ty: Type,
        span: Option<Span>,
    },

    #[error("Undefined reference to variable '{name}'")]
    UndefinedVariable { name: String, span: Option<Span> },

    #[error("No function '{name}' is defined")]
    UndefinedFunction { name: String, span: Option<Span> },

    #[error("Duplicate definition of function '{name}'")]
    DuplicateFunction { name: String, span: Option<Span> },

    #[error("Function name '{name}' is reserved")]
    ReservedFunctionName { name: String, span: Option<Span> },

    #[error("Duplicate variable '{name}'")]
    DuplicateVariable { name: String, span: Option<Span> },

    #[error("Duplicate formal parameter '{name}' in function declaration")]
    DuplicateParameter { name: String, span: Option<Span> },

    #[error("Variable '{name}' must not be of type 'void'")]
    VoidVariable { name: String, span: Option<Span> },

    #[error("Formal parameter '{name}' must not be of type 'void'")]
    VoidParameter { name: String, span: Option<Span> },

    #[error("Invalid array type definition: underlying type must not be 'void'")]
    VoidArrayElement { span: Option<Span> },

    #[error("Function '{name}' requires {expected} argument(s) but was called with {got}")]
    ArgCountMismatch {
        name: String,
        expected: usize,
        got: usize,
        span: Option<Span>,
    },

    #[error("Cannot index '{name}' of non-array type '{ty}'")]
    NonArrayIndex {
        name: String,
        ty: Type,
        span: Option<Span>,
    },

    #[error("Array index must be of type 'int' but found type '{ty}'")]
    InvalidIndex { ty: Type, span: Option<Span> },

    #[error("Cannot print expression of type '{ty}'")]
    UnprintableType { ty: Type, span: Option<Span> },

    #[error("Missing main() function")]
    MissingMain,

    #[error("Invalid main() declaration: {reason}")]
    InvalidMain { reason: String, span: Option<Span> },

    #[error("Cannot return expression from 'void' function")]
    ReturnValueFromVoid { span: Option<Span> },

    #[error("Return statement in non-void function must not be empty")]
    EmptyReturn { span: Option<Span> },

    // ==================== Resource Limits ====================

    #[error("Exceeded the maximum number of temporaries supported by the IR format")]
    TemporaryOverflow { span: Option<Span> },

    // ==================== Output ====================

    #[error("IO error: {0}")]
    Io(String),

    #[error("Cannot derive a program name from '{file}': {reason}")]
    InvalidProgramName { file: String, reason: String },
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::TypeMismatch { span, .. }
            | Self::InvalidOperandType { span, .. }
            | Self::UndefinedVariable { span, .. }
            | Self::UndefinedFunction { span, .. }
            | Self::DuplicateFunction { span, .. }
            | Self::ReservedFunctionName { span, .. }
            | Self::DuplicateVariable { span, .. }
            | Self::DuplicateParameter { span, .. }
            | Self::VoidVariable { span, .. }
            | Self::VoidParameter { span, .. }
            | Self::VoidArrayElement { span }
            | Self::ArgCountMismatch { span, .. }
            | Self::NonArrayIndex { span, .. }
            | Self::InvalidIndex { span, .. }
            | Self::UnprintableType { span, .. }
            | Self::InvalidMain { span, .. }
            | Self::ReturnValueFromVoid { span }
            | Self::EmptyReturn { span }
            | Self::TemporaryOverflow { span } => *span,
            Self::MissingMain | Self::Io(_) | Self::InvalidProgramName { .. } => None,
        }
    }

    /// Attach a position to a temporary overflow raised without one.
    pub fn with_span(self, at: Span) -> Self {
        match self {
            Self::TemporaryOverflow { span: None } => Self::TemporaryOverflow { span: Some(at) },
            other => other,
        }
    }

    /// Render as `ERROR: <line>:<offset> | <message>`, dropping the
    /// position part when none is known.
    pub fn message_with_position(&self) -> String {
        match self.span() {
            Some(span) => format!("ERROR: {} | {}", span, self),
            None => format!("ERROR: {}", self),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
