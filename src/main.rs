//! UL Compiler driver
//!
//! Reads a JSON-encoded AST from the front end and writes Jasmin assembler.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use ulc::backend::jasmin::write_program;
use ulc::frontend::ast::Program;
use ulc::frontend::pretty::pretty_print;
use ulc::frontend::semantic::SemanticAnalyzer;
use ulc::Error;

/// UL Compiler
#[derive(Parser, Debug)]
#[command(name = "ulc")]
#[command(version = "0.1.0")]
#[command(about = "UL compiler backend - emits Jasmin assembler for the JVM")]
struct Cli {
    /// AST produced by the front end (JSON)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Directory for generated files
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Also write the IR dump (<name>.ir)
    #[arg(long)]
    emit_ir: bool,

    /// Only run semantic analysis
    #[arg(long)]
    check: bool,

    /// Print the program back as UL source
    #[arg(long)]
    pretty: bool,

    /// Program (class) name; derived from FILE when omitted
    #[arg(long)]
    name: Option<String>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        match e.downcast_ref::<Error>() {
            Some(source_error) => eprintln!("{}", source_error.message_with_position()),
            None => eprintln!("ERROR: {:#}", e),
        }
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let program = read_program(&cli.input)?;
    debug!("loaded {} functions from {}", program.functions.len(), cli.input.display());

    if cli.pretty {
        print!("{}", pretty_print(&program));
    }

    if cli.check {
        SemanticAnalyzer::new().analyze(&program)?;
        println!("No errors found");
        return Ok(());
    }

    let name = match &cli.name {
        Some(name) => name.clone(),
        None => ulc::program_name(&cli.input)?,
    };
    let artifacts = ulc::compile(&program, &name)?;

    if cli.emit_ir {
        artifacts.ir.save(&cli.out_dir)?;
    }
    let path = write_program(&artifacts.jasmin, &cli.out_dir)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn read_program(path: &Path) -> Result<Program> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a valid UL AST", path.display()))
}
