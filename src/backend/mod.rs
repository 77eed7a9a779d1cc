//! Backend module - Code generation

pub mod codegen;
pub mod jasmin;

pub use codegen::CodeGen;
pub use jasmin::{JasminCodeGen, JasminProgram};
