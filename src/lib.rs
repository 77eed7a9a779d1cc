//! UL Compiler
//!
//! Backend for the UL teaching language: semantic analysis, lowering to a
//! linear IR, and Jasmin code generation for the JVM. The AST comes from an
//! external front end.

pub mod backend;
pub mod frontend;
pub mod middle;
pub mod types;
pub mod utils;

use std::path::Path;

use log::info;

use backend::{CodeGen, JasminCodeGen, JasminProgram};
use frontend::ast::Program;
use frontend::semantic::SemanticAnalyzer;
use middle::ir::IRProgram;
use middle::ir_gen::IRGenerator;

pub use utils::{Error, Result, Span};

/// Everything produced for one program
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub ir: IRProgram,
    pub jasmin: JasminProgram,
}

/// Run analysis, lowering and code generation
pub fn compile(program: &Program, name: &str) -> Result<Artifacts> {
    SemanticAnalyzer::new().analyze(program)?;
    info!("semantic analysis passed ({} functions)", program.functions.len());

    let ir = IRGenerator::new(name).generate(program)?;
    info!("lowered `{}` to IR", ir.name);

    let jasmin = JasminCodeGen::new().generate(&ir);
    Ok(Artifacts { ir, jasmin })
}

/// Program name for an input file: directories and everything from the
/// first `.` are dropped.
pub fn program_name(file: &Path) -> Result<String> {
    let invalid = |reason: &str| Error::InvalidProgramName {
        file: file.display().to_string(),
        reason: reason.to_string(),
    };

    let base = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| invalid("no file name"))?;

    if base.starts_with('.') {
        return Err(invalid("name must not begin with a period"));
    }
    let name = base.split('.').next().unwrap_or(base);
    Ok(name.to_string())
}
