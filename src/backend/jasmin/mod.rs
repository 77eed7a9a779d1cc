//! Jasmin Backend - JVM assembler text from UL IR
//!
//! The output is assembled into a class file by the external Jasmin tool.

mod jasmin_codegen;
mod program;
mod writer;

pub use jasmin_codegen::{JasminCodeGen, ENTRY_ALIAS};
pub use program::{
    JasminMethod, JasminProgram, JasminStatement, MethodSignature, VariableDeclaration,
    MIN_STACK_LIMIT,
};
pub use writer::write_program;
