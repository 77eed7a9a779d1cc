//! IR Generator - AST to UL IR
//!
//! Lowers a semantically valid AST into flat per-function instruction lists.
//! Types are not re-checked here.

use log::{debug, trace};

use crate::frontend::ast::{self, Block, Expr, Literal, Program, Stmt};
use crate::middle::ir::{
    ArrayAccess, Constant, Expression, FunctionCall, IRFunction, IRFunctionBuilder, IRProgram,
    IRProgramBuilder, Instruction, LabelFactory, Temporary,
};
use crate::middle::temp_pool::TempPool;
use crate::types::{MethodType, Type};
use crate::utils::{Environment, Result, Span};

/// State that lives for exactly one function
struct FunctionContext {
    pool: TempPool,
    labels: LabelFactory,
    variables: Environment<String, Temporary>,
    builder: IRFunctionBuilder,
}

impl FunctionContext {
    fn new(name: &str, ty: MethodType) -> Self {
        Self {
            pool: TempPool::new(),
            labels: LabelFactory::new(),
            variables: Environment::new(),
            builder: IRFunctionBuilder::new(name, ty),
        }
    }

    fn emit(&mut self, inst: Instruction) {
        trace!("  {}", inst);
        self.builder.push(inst);
    }

    fn temp(&mut self, ty: Type, span: Span) -> Result<Temporary> {
        self.pool.acquire_temp(ty).map_err(|e| e.with_span(span))
    }

    /// Bound temporary for `name`; the analyzer guarantees it exists
    fn variable(&self, name: &str) -> Temporary {
        match self.variables.lookup(&name.to_string()) {
            Some(temp) => temp.clone(),
            None => panic!("unbound variable `{}` reached lowering", name),
        }
    }
}

/// IR Generator
pub struct IRGenerator {
    program: IRProgramBuilder,
    /// Function name to return type
    functions: Environment<String, Type>,
}

impl IRGenerator {
    pub fn new(program_name: &str) -> Self {
        Self {
            program: IRProgramBuilder::new(program_name),
            functions: Environment::new(),
        }
    }

    /// Lower a whole program
    pub fn generate(mut self, program: &Program) -> Result<IRProgram> {
        // Return types first so calls can precede their callee
        for func in &program.functions {
            self.functions.bind(func.decl.name.name.clone(), func.decl.ret_type.ty);
        }

        for func in &program.functions {
            let lowered = self.generate_function(func)?;
            self.program.add_function(lowered);
        }

        Ok(self.program.build())
    }

    fn generate_function(&self, func: &ast::Function) -> Result<IRFunction> {
        let decl = &func.decl;
        let ty = MethodType::new(
            decl.formals.iter().map(|f| f.ty.ty).collect(),
            decl.ret_type.ty,
        );
        let mut ctx = FunctionContext::new(&decl.name.name, ty);

        for formal in &decl.formals {
            let temp = ctx
                .pool
                .acquire_param(formal.ty.ty, &formal.name.name)
                .map_err(|e| e.with_span(formal.name.span))?;
            ctx.variables.bind(formal.name.name.clone(), temp);
        }

        for var in &func.body.declarations {
            let temp = ctx
                .pool
                .acquire_local(var.ty.ty, &var.name.name)
                .map_err(|e| e.with_span(var.name.span))?;
            if let Type::Array { element, size } = var.ty.ty {
                ctx.emit(Instruction::Assign {
                    dest: temp.clone(),
                    value: Expression::NewArray { element, size },
                });
            }
            ctx.variables.bind(var.name.name.clone(), temp);
        }

        for stmt in &func.body.statements {
            self.generate_stmt(&mut ctx, stmt)?;
        }

        if decl.ret_type.ty.is_void() && !ctx.builder.last().is_some_and(Instruction::is_return) {
            ctx.emit(Instruction::Return(None));
        }

        let lowered = ctx.builder.build(ctx.pool.temps().to_vec());
        debug!(
            "lowered `{}`: {} temporaries, {} instructions",
            lowered.name,
            lowered.temps.len(),
            lowered.instructions.len()
        );
        Ok(lowered)
    }

    fn generate_block(&self, ctx: &mut FunctionContext, block: &Block) -> Result<()> {
        ctx.variables.enter_scope();
        for stmt in &block.statements {
            self.generate_stmt(ctx, stmt)?;
        }
        ctx.variables.exit_scope().expect("unbalanced scope");
        Ok(())
    }

    fn generate_stmt(&self, ctx: &mut FunctionContext, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Expr(expr) => self.generate_discarded(ctx, expr)?,
            Stmt::Print { expr, .. } => {
                let value = self.generate_expr(ctx, expr)?;
                ctx.emit(Instruction::Print(value));
            }
            Stmt::Println { expr, .. } => {
                let value = self.generate_expr(ctx, expr)?;
                ctx.emit(Instruction::Println(value));
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => Some(self.generate_expr(ctx, expr)?),
                    None => None,
                };
                ctx.emit(Instruction::Return(value));
            }
            Stmt::Assign { target, value } => {
                let source = self.generate_expr(ctx, value)?;
                let dest = ctx.variable(&target.name);
                ctx.emit(Instruction::Assign { dest, value: Expression::Temp(source) });
            }
            Stmt::ArrayAssign { array, index, value } => {
                let index = self.generate_expr(ctx, index)?;
                let value = self.generate_expr(ctx, value)?;
                let access = ArrayAccess { array: ctx.variable(&array.name), index };
                ctx.emit(Instruction::ArrayAssign { access, value });
            }
            Stmt::If { cond, then_block, else_block, span } => {
                let else_label = ctx.labels.next_label();
                let end_label = ctx.labels.next_label();

                let negated = self.generate_negated_condition(ctx, cond, *span)?;
                ctx.emit(Instruction::CondJump { cond: negated, target: else_label });
                self.generate_block(ctx, then_block)?;
                ctx.emit(Instruction::Jump(end_label));
                ctx.emit(Instruction::Label(else_label));
                if let Some(else_block) = else_block {
                    self.generate_block(ctx, else_block)?;
                }
                ctx.emit(Instruction::Label(end_label));
            }
            Stmt::While { cond, body, span } => {
                let top_label = ctx.labels.next_label();
                let exit_label = ctx.labels.next_label();

                ctx.emit(Instruction::Label(top_label));
                let negated = self.generate_negated_condition(ctx, cond, *span)?;
                ctx.emit(Instruction::CondJump { cond: negated, target: exit_label });
                self.generate_block(ctx, body)?;
                ctx.emit(Instruction::Jump(top_label));
                ctx.emit(Instruction::Label(exit_label));
            }
        }
        Ok(())
    }

    /// Evaluate for side effects only; the one place a void call may appear
    fn generate_discarded(&self, ctx: &mut FunctionContext, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Paren { inner, .. } => self.generate_discarded(ctx, inner),
            Expr::Call { name, args } => self.generate_call(ctx, name, args).map(|_| ()),
            other => self.generate_expr(ctx, other).map(|_| ()),
        }
    }

    /// `n := Z! cond`, so branches can jump on the false case
    fn generate_negated_condition(
        &self,
        ctx: &mut FunctionContext,
        cond: &Expr,
        span: Span,
    ) -> Result<Temporary> {
        let value = self.generate_expr(ctx, cond)?;
        let negated = ctx.temp(Type::BOOLEAN, span)?;
        ctx.emit(Instruction::Assign { dest: negated.clone(), value: Expression::Not(value) });
        Ok(negated)
    }

    fn generate_expr(&self, ctx: &mut FunctionContext, expr: &Expr) -> Result<Temporary> {
        match expr {
            Expr::Literal { value, span } => {
                let constant = match value {
                    Literal::Int(n) => Constant::Integer(*n),
                    Literal::Float(n) => Constant::Float(*n),
                    Literal::Bool(b) => Constant::Boolean(*b),
                    Literal::Char(c) => Constant::Character(*c),
                    Literal::String(s) => Constant::String(s.clone()),
                };
                let dest = ctx.temp(constant.ty(), *span)?;
                ctx.emit(Instruction::Assign {
                    dest: dest.clone(),
                    value: Expression::Constant(constant),
                });
                Ok(dest)
            }
            Expr::Ident(ident) => Ok(ctx.variable(&ident.name)),
            Expr::Binary { op, left, right } => {
                let left = self.generate_expr(ctx, left)?;
                let right = self.generate_expr(ctx, right)?;
                let dest = ctx.temp(op.result_type(left.ty), expr.span())?;
                ctx.emit(Instruction::Assign {
                    dest: dest.clone(),
                    value: Expression::Binary { op: *op, left, right },
                });
                Ok(dest)
            }
            Expr::Paren { inner, .. } => self.generate_expr(ctx, inner),
            Expr::Call { name, args } => match self.generate_call(ctx, name, args)? {
                Some(result) => Ok(result),
                None => panic!("void call to `{}` used as a value", name.name),
            },
            Expr::Index { array, index } => {
                let index = self.generate_expr(ctx, index)?;
                let access = ArrayAccess { array: ctx.variable(&array.name), index };
                let dest = ctx.temp(access.element_type(), array.span)?;
                ctx.emit(Instruction::Assign {
                    dest: dest.clone(),
                    value: Expression::ArrayAccess(access),
                });
                Ok(dest)
            }
        }
    }

    /// Emit a call. Non-void callees get a result temporary.
    fn generate_call(
        &self,
        ctx: &mut FunctionContext,
        name: &ast::Ident,
        args: &[Expr],
    ) -> Result<Option<Temporary>> {
        let mut arg_temps = Vec::with_capacity(args.len());
        for arg in args {
            arg_temps.push(self.generate_expr(ctx, arg)?);
        }

        let ret = match self.functions.lookup(&name.name) {
            Some(ty) => *ty,
            None => panic!("call to unknown function `{}` reached lowering", name.name),
        };
        let call = FunctionCall { name: name.name.clone(), args: arg_temps };

        if ret.is_void() {
            ctx.emit(Instruction::Call(call));
            Ok(None)
        } else {
            let dest = ctx.temp(ret, name.span)?;
            ctx.emit(Instruction::Assign { dest: dest.clone(), value: Expression::Call(call) });
            Ok(Some(dest))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::build::*;
    use crate::frontend::ast::BinOp;
    use crate::middle::ir::{Label, TempKind};
    use crate::middle::temp_pool::MAX_TEMPORARIES;
    use crate::types::PrimitiveType;
    use crate::utils::Error;
    use pretty_assertions::assert_eq;

    fn lower(functions: Vec<ast::Function>) -> IRProgram {
        IRGenerator::new("Test").generate(&program(functions)).unwrap()
    }

    fn text(func: &IRFunction) -> Vec<String> {
        func.instructions.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_return_binary_expression() {
        let prog = lower(vec![
            function(Type::INT, "f", vec![], vec![], vec![ret(Some(binary(BinOp::Add, int(1), int(2))))]),
            main_fn(vec![], vec![]),
        ]);
        let f = &prog.functions[0];
        assert_eq!(
            text(f),
            vec!["T0 := 1;", "T1 := 2;", "T2 := T0 I+ T1;", "RETURN T2;"]
        );
        assert_eq!(f.temps.len(), 3);
        assert!(f.temps.iter().all(|t| t.kind == TempKind::True));
    }

    #[test]
    fn test_temporary_overflow_reports_position() {
        let mut statements: Vec<Stmt> = (0..MAX_TEMPORARIES).map(|_| print(int(0))).collect();
        statements.push(print(Expr::Literal { value: Literal::Int(1), span: Span::new(9, 4) }));
        let result = IRGenerator::new("Big").generate(&program(vec![main_fn(vec![], statements)]));
        assert_eq!(result.unwrap_err(), Error::TemporaryOverflow { span: Some(Span::new(9, 4)) });
    }

    #[test]
    fn test_context_overflow_takes_expression_span() {
        let mut ctx = FunctionContext::new("f", MethodType::default());
        for _ in 0..MAX_TEMPORARIES {
            ctx.pool.acquire_temp(Type::INT).unwrap();
        }
        assert_eq!(
            ctx.temp(Type::INT, Span::new(7, 3)),
            Err(Error::TemporaryOverflow { span: Some(Span::new(7, 3)) })
        );
    }

    #[test]
    fn test_scopes_unwind_after_nested_blocks() {
        let func = main_fn(
            vec![(Type::INT, "i")],
            vec![while_stmt(
                binary(BinOp::Less, var("i"), int(3)),
                vec![if_stmt(boolean(true), vec![assign("i", int(3))], Some(vec![]))],
            )],
        );
        let generator = IRGenerator::new("Scopes");
        let mut ctx = FunctionContext::new("main", MethodType::default());
        let i = ctx.pool.acquire_local(Type::INT, "i").unwrap();
        ctx.variables.bind("i".to_string(), i);
        let depth = ctx.variables.depth();
        for stmt in &func.body.statements {
            generator.generate_stmt(&mut ctx, stmt).unwrap();
        }
        assert_eq!(ctx.variables.depth(), depth);
    }

    #[test]
    fn test_while_template() {
        let prog = lower(vec![main_fn(
            vec![(Type::INT, "i")],
            vec![while_stmt(
                binary(BinOp::Less, var("i"), int(10)),
                vec![assign("i", binary(BinOp::Add, var("i"), int(1)))],
            )],
        )]);
        assert_eq!(
            text(&prog.functions[0]),
            vec![
                "L0:;",
                "T1 := 10;",
                "T2 := T0 I< T1;",
                "T3 := Z! T2;",
                "IF T3 GOTO L1;",
                "T4 := 1;",
                "T5 := T0 I+ T4;",
                "T0 := T5;",
                "GOTO L0;",
                "L1:;",
                "RETURN;",
            ]
        );
        assert_eq!(prog.functions[0].max_label(), Some(1));
    }

    #[test]
    fn test_if_else_template() {
        let prog = lower(vec![main_fn(
            vec![],
            vec![if_stmt(boolean(true), vec![print(int(1))], Some(vec![print(int(2))]))],
        )]);
        assert_eq!(
            text(&prog.functions[0]),
            vec![
                "T0 := TRUE;",
                "T1 := Z! T0;",
                "IF T1 GOTO L0;",
                "T2 := 1;",
                "PRINTI T2;",
                "GOTO L1;",
                "L0:;",
                "T3 := 2;",
                "PRINTI T3;",
                "L1:;",
                "RETURN;",
            ]
        );
    }

    #[test]
    fn test_if_without_else_still_defines_both_labels() {
        let prog = lower(vec![main_fn(vec![], vec![if_stmt(boolean(false), vec![], None)])]);
        let labels: Vec<Label> = prog.functions[0]
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Label(l) => Some(*l),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec![Label(0), Label(1)]);
    }

    #[test]
    fn test_temporary_ranges_follow_traversal() {
        let prog = lower(vec![
            function(
                Type::INT,
                "f",
                vec![(Type::INT, "a"), (Type::FLOAT, "b")],
                vec![(Type::CHAR, "c")],
                vec![ret(Some(var("a")))],
            ),
            main_fn(vec![], vec![]),
        ]);
        let f = &prog.functions[0];
        let decls: Vec<String> = f.temps.iter().map(Temporary::declaration).collect();
        assert_eq!(
            decls,
            vec!["TEMP 0:I [P(\"a\")];", "TEMP 1:F [P(\"b\")];", "TEMP 2:C [L(\"c\")];"]
        );
        assert_eq!(text(f), vec!["RETURN T0;"]);
        assert_eq!(f.ty.ir_string(), "(IF)I");
    }

    #[test]
    fn test_array_local_allocation_and_access() {
        let prog = lower(vec![main_fn(
            vec![(Type::array(PrimitiveType::Integer, 4), "xs")],
            vec![array_assign("xs", int(0), int(7)), println(index("xs", int(0)))],
        )]);
        assert_eq!(
            text(&prog.functions[0]),
            vec![
                "T0 := NEWARRAY I 4;",
                "T1 := 0;",
                "T2 := 7;",
                "T0[T1] := T2;",
                "T3 := 0;",
                "T4 := T0[T3];",
                "PRINTLNI T4;",
                "RETURN;",
            ]
        );
    }

    #[test]
    fn test_calls_forward_and_void() {
        let prog = lower(vec![
            main_fn(
                vec![(Type::INT, "x")],
                vec![assign("x", call("twice", vec![int(4)])), Stmt::Expr(call("log", vec![var("x")]))],
            ),
            function(Type::INT, "twice", vec![(Type::INT, "n")], vec![], vec![ret(Some(binary(BinOp::Mul, var("n"), int(2))))]),
            function(Type::VOID, "log", vec![(Type::INT, "n")], vec![], vec![println(var("n")), ret(None)]),
        ]);
        assert_eq!(
            text(&prog.functions[0]),
            vec!["T1 := 4;", "T2 := CALL twice(T1);", "T0 := T2;", "CALL log(T0);", "RETURN;"]
        );
        // Already ends in a return; nothing appended
        assert_eq!(text(&prog.functions[2]), vec!["PRINTLNI T0;", "RETURN;"]);
    }

    #[test]
    fn test_non_void_function_gets_no_synthetic_return() {
        let prog = lower(vec![
            function(Type::BOOLEAN, "f", vec![], vec![], vec![if_stmt(boolean(true), vec![ret(Some(boolean(true)))], Some(vec![ret(Some(boolean(false)))]))]),
            main_fn(vec![], vec![]),
        ]);
        assert!(matches!(prog.functions[0].instructions.last(), Some(Instruction::Label(_))));
        assert_eq!(text(&prog.functions[1]), vec!["RETURN;"]);
    }

    #[test]
    fn test_state_resets_between_functions() {
        let body = || vec![while_stmt(boolean(false), vec![])];
        let prog = lower(vec![
            function(Type::VOID, "a", vec![], vec![], body()),
            main_fn(vec![], body()),
        ]);
        assert_eq!(text(&prog.functions[0]), text(&prog.functions[1]));
        assert_eq!(prog.name, "Test");
    }

    #[test]
    fn test_paren_and_string_concat() {
        let prog = lower(vec![main_fn(
            vec![],
            vec![print(paren(binary(BinOp::Add, string("a"), string("b"))))],
        )]);
        assert_eq!(
            text(&prog.functions[0]),
            vec!["T0 := \"a\";", "T1 := \"b\";", "T2 := T0 U+ T1;", "PRINTU T2;", "RETURN;"]
        );
    }

    #[test]
    fn test_parenthesized_void_call_statement() {
        let prog = lower(vec![
            function(Type::VOID, "log", vec![], vec![], vec![]),
            main_fn(vec![], vec![Stmt::Expr(paren(call("log", vec![])))]),
        ]);
        assert_eq!(text(&prog.functions[1]), vec!["CALL log();", "RETURN;"]);
    }

    #[test]
    #[should_panic(expected = "void call to `log` used as a value")]
    fn test_void_call_as_value_panics() {
        lower(vec![
            function(Type::VOID, "log", vec![], vec![], vec![]),
            main_fn(vec![], vec![print(call("log", vec![]))]),
        ]);
    }
}
