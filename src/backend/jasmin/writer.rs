//! Persists a `JasminProgram` as `<class>.j`.
//!
//! Text goes to a `.j.partial` file first and is renamed into place only
//! after every byte is flushed, so a failed run never leaves a `.j` that
//! looks complete.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::backend::jasmin::program::JasminProgram;
use crate::utils::Result;

/// Write `program` into `dir` and return the final path
pub fn write_program(program: &JasminProgram, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format!("{}.j", program.class_name));
    let staging = dir.join(format!("{}.j.partial", program.class_name));

    if let Err(e) = write_staged(program, &staging) {
        warn!("discarding partial output {}", staging.display());
        let _ = fs::remove_file(&staging);
        return Err(e);
    }

    if let Err(e) = fs::rename(&staging, &path) {
        warn!("discarding partial output {}", staging.display());
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }
    info!("wrote {}", path.display());
    Ok(path)
}

fn write_staged(program: &JasminProgram, staging: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(staging)?);
    write!(out, "{}", program)?;
    out.flush()?;
    Ok(())
}
