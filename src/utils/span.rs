//! Source location tracking

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in the UL source, as reported by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// 1-based line number
    pub line: u32,
    /// Character offset within the line
    pub offset: u32,
}

impl Span {
    /// Create a new span
    pub fn new(line: u32, offset: u32) -> Self {
        Self { line, offset }
    }

    /// Create a dummy span (for testing)
    pub fn dummy() -> Self {
        Self { line: 0, offset: 0 }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.offset)
    }
}
