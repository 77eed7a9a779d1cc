//! IR Printer - textual UL IR
//!
//! Debugging output only; nothing reads it back.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::middle::ir::{IRFunction, IRProgram};
use crate::utils::Result;

/// Render a program in the IR text format
pub fn print_ir(program: &IRProgram) -> String {
    program.to_string()
}

impl fmt::Display for IRFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FUNC {} {}", self.name, self.ty.ir_string())?;
        writeln!(f, "{{")?;
        for temp in &self.temps {
            writeln!(f, "\t{}", temp.declaration())?;
        }
        for inst in &self.instructions {
            writeln!(f, "\t{}", inst)?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for IRProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PROG {}", self.name)?;
        for func in &self.functions {
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}

impl IRProgram {
    /// Write `<dir>/<name>.ir`
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.ir", self.name));
        fs::write(&path, print_ir(self))?;
        info!("wrote IR to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::build::*;
    use crate::frontend::ast::BinOp;
    use crate::middle::ir_gen::IRGenerator;
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    fn add_program() -> IRProgram {
        let prog = program(vec![
            function(
                Type::INT,
                "add",
                vec![(Type::INT, "a"), (Type::INT, "b")],
                vec![],
                vec![ret(Some(binary(BinOp::Add, var("a"), var("b"))))],
            ),
            main_fn(vec![], vec![]),
        ]);
        IRGenerator::new("Adder").generate(&prog).unwrap()
    }

    #[test]
    fn test_print_program() {
        let expected = "\
PROG Adder
FUNC add (II)I
{
\tTEMP 0:I [P(\"a\")];
\tTEMP 1:I [P(\"b\")];
\tTEMP 2:I;
\tT2 := T0 I+ T1;
\tRETURN T2;
}
FUNC main ()V
{
\tRETURN;
}
";
        assert_eq!(print_ir(&add_program()), expected);
    }

    #[test]
    fn test_save_writes_named_file() {
        let dir = std::env::temp_dir().join("ulc_ir_printer_test");
        fs::create_dir_all(&dir).unwrap();

        let prog = add_program();
        let path = prog.save(&dir).unwrap();
        assert_eq!(path.file_name().unwrap(), "Adder.ir");
        assert_eq!(fs::read_to_string(&path).unwrap(), print_ir(&prog));

        fs::remove_dir_all(&dir).ok();
    }
}
