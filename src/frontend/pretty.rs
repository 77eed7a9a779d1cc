//! AST Pretty Printer
//!
//! Reprints a program as UL source with four-space indentation.

use crate::frontend::ast::*;

const INDENT: &str = "    ";

/// Render a whole program
pub fn pretty_print(program: &Program) -> String {
    let mut printer = PrettyPrinter::new();
    for func in &program.functions {
        printer.function(func);
    }
    printer.out
}

/// Render a single expression
pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

struct PrettyPrinter {
    out: String,
    level: usize,
}

impl PrettyPrinter {
    fn new() -> Self {
        Self { out: String::new(), level: 0 }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.level {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn function(&mut self, func: &Function) {
        let decl = &func.decl;
        let formals: Vec<String> = decl
            .formals
            .iter()
            .map(|f| format!("{} {}", f.ty.ty, f.name.name))
            .collect();
        self.line(&format!("{} {} ({})", decl.ret_type.ty, decl.name.name, formals.join(", ")));

        self.line("{");
        self.level += 1;
        let body = &func.body;
        for var in &body.declarations {
            self.line(&format!("{} {};", var.ty.ty, var.name.name));
        }
        if !body.declarations.is_empty() && !body.statements.is_empty() {
            self.out.push('\n');
        }
        for stmt in &body.statements {
            self.stmt(stmt);
        }
        self.level -= 1;
        self.line("}");
        self.out.push('\n');
    }

    fn block(&mut self, block: &Block) {
        self.line("{");
        self.level += 1;
        for stmt in &block.statements {
            self.stmt(stmt);
        }
        self.level -= 1;
        self.line("}");
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => self.line(&format!("{};", print_expr(expr))),
            Stmt::Print { expr, .. } => self.line(&format!("print {};", print_expr(expr))),
            Stmt::Println { expr, .. } => self.line(&format!("println {};", print_expr(expr))),
            Stmt::Return { value: Some(value), .. } => {
                self.line(&format!("return {};", print_expr(value)))
            }
            Stmt::Return { value: None, .. } => self.line("return;"),
            Stmt::Assign { target, value } => {
                self.line(&format!("{} = {};", target.name, print_expr(value)))
            }
            Stmt::ArrayAssign { array, index, value } => self.line(&format!(
                "{}[{}] = {};",
                array.name,
                print_expr(index),
                print_expr(value)
            )),
            Stmt::If { cond, then_block, else_block, .. } => {
                self.line(&format!("if ({})", print_expr(cond)));
                self.block(then_block);
                if let Some(else_block) = else_block {
                    self.line("else");
                    self.block(else_block);
                }
            }
            Stmt::While { cond, body, .. } => {
                self.line(&format!("while ({})", print_expr(cond)));
                self.block(body);
            }
        }
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Literal { value, .. } => match value {
            Literal::Int(n) => out.push_str(&n.to_string()),
            Literal::Float(n) => out.push_str(&format!("{:?}", n)),
            Literal::Bool(b) => out.push_str(&b.to_string()),
            Literal::Char(c) => out.push_str(&format!("'{}'", c)),
            Literal::String(s) => out.push_str(&format!("\"{}\"", s)),
        },
        Expr::Ident(ident) => out.push_str(&ident.name),
        Expr::Binary { op, left, right } => {
            write_expr(out, left);
            out.push_str(op.symbol());
            write_expr(out, right);
        }
        Expr::Paren { inner, .. } => {
            out.push('(');
            write_expr(out, inner);
            out.push(')');
        }
        Expr::Call { name, args } => {
            out.push_str(&name.name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg);
            }
            out.push(')');
        }
        Expr::Index { array, index } => {
            out.push_str(&array.name);
            out.push('[');
            write_expr(out, index);
            out.push(']');
        }
    }
}
