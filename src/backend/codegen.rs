//! Code Generation trait - Backend abstraction
//!
//! A backend turns a lowered program into a target-specific artifact.

use crate::middle::ir::IRProgram;

/// Code generation backend trait
pub trait CodeGen {
    /// Structured artifact produced for one program
    type Output;

    /// Generate target code from an IR program
    fn generate(&mut self, program: &IRProgram) -> Self::Output;

    /// Get the backend name
    fn name(&self) -> &str;

    /// Extension of the persisted artifact, without the dot
    fn file_extension(&self) -> &str;
}
