//! Jasmin Code Generator
//!
//! Translates UL IR to Jasmin assembler for the JVM. Every temporary maps
//! to the local slot with its global index; booleans and characters live
//! in int slots as 0/1 and code points.

use log::debug;

use crate::backend::codegen::CodeGen;
use crate::backend::jasmin::program::{
    JasminMethod, JasminProgram, JasminStatement, MethodSignature, VariableDeclaration,
    MIN_STACK_LIMIT,
};
use crate::frontend::semantic::MAIN_ALIAS;
use crate::middle::ir::*;
use crate::types::{MethodType, PrimitiveType, Type};

/// Name the user's `main` is emitted under
pub const ENTRY_ALIAS: &str = MAIN_ALIAS;

const PRINT_STREAM: &str = "java/lang/System/out Ljava/io/PrintStream;";
const STRING_BUFFER: &str = "java/lang/StringBuffer";

/// JVM method name for a UL function
fn method_name(name: &str) -> &str {
    if name == "main" {
        ENTRY_ALIAS
    } else {
        name
    }
}

/// Load/store/return family of a value type
fn type_prefix(ty: &Type) -> &'static str {
    match ty {
        Type::Array { .. } => "a",
        Type::Primitive(p) => match p {
            PrimitiveType::String => "a",
            PrimitiveType::Integer | PrimitiveType::Boolean | PrimitiveType::Character => "i",
            PrimitiveType::Float => "f",
            PrimitiveType::Void => panic!("void value reached code generation"),
        },
    }
}

/// Array load/store family of an element kind
fn array_prefix(element: PrimitiveType) -> &'static str {
    match element {
        PrimitiveType::Integer => "ia",
        PrimitiveType::Float => "fa",
        PrimitiveType::Character => "ca",
        PrimitiveType::Boolean => "ba",
        PrimitiveType::String => "aa",
        PrimitiveType::Void => panic!("void array reached code generation"),
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Float operand that always carries a fractional part, so Jasmin never
/// reads it as an int
fn float_literal(n: f32) -> String {
    let text = n.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

/// Per-method emission state
struct MethodContext<'a> {
    class: &'a str,
    labels: LabelFactory,
    statements: Vec<JasminStatement>,
    /// Set after `goto`/return until the next label
    unreachable: bool,
}

impl<'a> MethodContext<'a> {
    fn new(class: &'a str, labels: LabelFactory) -> Self {
        Self { class, labels, statements: Vec::new(), unreachable: false }
    }

    fn op(&mut self, opcode: &str) {
        self.statements.push(JasminStatement::op(opcode));
    }

    fn op_with(&mut self, opcode: &str, operand: impl std::fmt::Display) {
        self.statements.push(JasminStatement::op_with(opcode, operand));
    }

    fn load(&mut self, temp: &Temporary) {
        self.op_with(&format!("{}load", type_prefix(&temp.ty)), temp.global_index());
    }

    fn store(&mut self, temp: &Temporary) {
        self.op_with(&format!("{}store", type_prefix(&temp.ty)), temp.global_index());
    }

    fn label(&mut self, label: Label) {
        self.statements.push(JasminStatement::Label(label));
        self.unreachable = false;
    }

    fn instruction(&mut self, inst: &Instruction) {
        match inst {
            Instruction::Assign { dest, value } => {
                self.expression(dest, value);
                self.store(dest);
            }
            Instruction::ArrayAssign { access, value } => {
                self.load(&access.array);
                self.load(&access.index);
                self.load(value);
                self.op(&format!("{}store", array_prefix(element_kind(&access.array.ty))));
            }
            Instruction::Jump(target) => {
                if !self.unreachable {
                    self.op_with("goto", target);
                    self.unreachable = true;
                }
            }
            Instruction::CondJump { cond, target } => {
                if !self.unreachable {
                    self.load(cond);
                    self.op_with("ifne", target);
                }
            }
            Instruction::Label(label) => self.label(*label),
            Instruction::Call(call) => self.call(call, Type::VOID),
            Instruction::Return(value) => {
                if !self.unreachable {
                    match value {
                        Some(temp) => {
                            self.load(temp);
                            self.op(&format!("{}return", type_prefix(&temp.ty)));
                        }
                        None => self.op("return"),
                    }
                    self.unreachable = true;
                }
            }
            Instruction::Print(temp) => self.print("print", temp),
            Instruction::Println(temp) => self.print("println", temp),
        }
    }

    /// Leave the value of `value` on the stack
    fn expression(&mut self, dest: &Temporary, value: &Expression) {
        match value {
            Expression::Constant(constant) => self.constant(constant),
            Expression::Temp(source) => self.load(source),
            Expression::Binary { op, left, right } => self.binary(*op, left, right),
            Expression::Not(operand) => {
                self.load(operand);
                self.op_with("ldc", 1);
                self.op("ixor");
            }
            Expression::ArrayAccess(access) => {
                self.load(&access.array);
                self.load(&access.index);
                self.op(&format!("{}load", array_prefix(element_kind(&access.array.ty))));
            }
            Expression::NewArray { element, size } => {
                self.op_with("ldc", size);
                match element {
                    PrimitiveType::String => self.op_with("anewarray", "java/lang/String"),
                    other => self.op_with("newarray", other.name()),
                }
            }
            Expression::Call(call) => self.call(call, dest.ty),
        }
    }

    fn constant(&mut self, constant: &Constant) {
        match constant {
            Constant::Boolean(b) => self.op_with("ldc", u8::from(*b)),
            Constant::Integer(n) => self.op_with("ldc", n),
            Constant::Float(n) => self.op_with("ldc", float_literal(*n)),
            Constant::Character(c) => self.op_with("ldc", u32::from(*c)),
            Constant::String(s) => self.op_with("ldc", escape_string(s)),
        }
    }

    fn binary(&mut self, op: BinOp, left: &Temporary, right: &Temporary) {
        if !op.accepts(&left.ty) {
            panic!("no instruction for `{}` over {}", op.symbol(), left.ty);
        }

        match op {
            BinOp::Add if left.ty == Type::STRING => self.concat(left, right),
            BinOp::Add | BinOp::Sub | BinOp::Mul => {
                self.load(left);
                self.load(right);
                let name = match op {
                    BinOp::Add => "add",
                    BinOp::Sub => "sub",
                    _ => "mul",
                };
                self.op(&format!("{}{}", type_prefix(&left.ty), name));
                if left.ty == Type::CHAR {
                    self.op("i2c");
                }
            }
            BinOp::Eq if left.ty == Type::BOOLEAN => {
                self.load(left);
                self.load(right);
                self.op("ixor");
                self.op_with("ldc", 1);
                self.op("ixor");
            }
            BinOp::Less | BinOp::Eq => {
                self.load(left);
                self.load(right);
                let less = op == BinOp::Less;
                let branch = if left.ty == Type::FLOAT {
                    // fcmpg yields 1 on NaN, so `<` stays false
                    self.op(if less { "fcmpg" } else { "fcmpl" });
                    if less { "iflt" } else { "ifeq" }
                } else if left.ty == Type::STRING {
                    self.op_with("invokevirtual", "java/lang/String/compareTo(Ljava/lang/String;)I");
                    if less { "iflt" } else { "ifeq" }
                } else {
                    // Compare both operands directly; a subtraction could wrap
                    if less { "if_icmplt" } else { "if_icmpeq" }
                };
                self.compare_to_boolean(branch);
            }
        }
    }

    /// Replace the compared operands with 0/1, taking `branch` for 1
    fn compare_to_boolean(&mut self, branch: &str) {
        let true_label = self.labels.next_label();
        let join_label = self.labels.next_label();
        self.op_with(branch, true_label);
        self.op_with("ldc", 0);
        self.op_with("goto", join_label);
        self.statements.push(JasminStatement::Label(true_label));
        self.op_with("ldc", 1);
        self.statements.push(JasminStatement::Label(join_label));
    }

    fn concat(&mut self, left: &Temporary, right: &Temporary) {
        let append = format!("{}/append(Ljava/lang/String;)L{};", STRING_BUFFER, STRING_BUFFER);
        self.op_with("new", STRING_BUFFER);
        self.op("dup");
        self.op_with("invokenonvirtual", format!("{}/<init>()V", STRING_BUFFER));
        self.load(left);
        self.op_with("invokevirtual", &append);
        self.load(right);
        self.op_with("invokevirtual", &append);
        self.op_with("invokevirtual", format!("{}/toString()Ljava/lang/String;", STRING_BUFFER));
    }

    fn call(&mut self, call: &FunctionCall, ret: Type) {
        for arg in &call.args {
            self.load(arg);
        }
        let ty = MethodType::new(call.args.iter().map(|t| t.ty).collect(), ret);
        self.statements.push(JasminStatement::Call {
            class: self.class.to_string(),
            target: MethodSignature::new_static(method_name(&call.name), ty),
        });
    }

    fn print(&mut self, method: &str, temp: &Temporary) {
        self.op_with("getstatic", PRINT_STREAM);
        self.load(temp);
        self.op_with(
            "invokevirtual",
            format!("java/io/PrintStream/{}({})V", method, temp.ty.jasmin_descriptor()),
        );
    }
}

fn element_kind(ty: &Type) -> PrimitiveType {
    match ty {
        Type::Array { element, .. } => *element,
        Type::Primitive(_) => panic!("indexing non-array type {}", ty),
    }
}

/// Jasmin code generator
#[derive(Debug, Default)]
pub struct JasminCodeGen;

impl JasminCodeGen {
    pub fn new() -> Self {
        Self
    }

    fn generate_function(&self, class: &str, func: &IRFunction, stack_limit: u32) -> JasminMethod {
        // Auxiliary labels sit above every IR label
        let seed = func.max_label().map_or(0, |max| max + 1);
        let mut ctx = MethodContext::new(class, LabelFactory::starting_at(seed));

        let start = ctx.labels.next_label();
        let end = ctx.labels.next_label();
        let variables = func
            .temps
            .iter()
            .filter_map(|temp| {
                temp.alias.as_ref().map(|alias| VariableDeclaration {
                    slot: temp.global_index(),
                    name: alias.clone(),
                    ty: temp.ty,
                    start,
                    end,
                })
            })
            .collect();

        ctx.label(start);
        for inst in &func.instructions {
            ctx.instruction(inst);
        }
        ctx.label(end);

        debug!(
            "generated `{}`: {} locals, labels from L{}",
            func.name,
            func.temps.len(),
            seed
        );

        JasminMethod {
            signature: MethodSignature::new_static(method_name(&func.name), func.ty.clone()),
            locals_limit: Some(func.temps.len() as u32),
            stack_limit: Some(stack_limit),
            variables,
            statements: ctx.statements,
        }
    }
}

impl CodeGen for JasminCodeGen {
    type Output = JasminProgram;

    fn generate(&mut self, program: &IRProgram) -> JasminProgram {
        let stack_limit = program
            .functions
            .iter()
            .map(|f| f.ty.params.len() as u32 + 2)
            .fold(MIN_STACK_LIMIT, u32::max);

        let mut methods = vec![
            JasminMethod::constructor(),
            JasminMethod::entry_point(&program.name, ENTRY_ALIAS),
        ];
        for func in &program.functions {
            methods.push(self.generate_function(&program.name, func, stack_limit));
        }

        JasminProgram {
            class_name: program.name.clone(),
            source_file: format!("{}.ul", program.name),
            methods,
        }
    }

    fn name(&self) -> &str {
        "jasmin"
    }

    fn file_extension(&self) -> &str {
        "j"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::build::*;
    use crate::frontend::ast::{self, Stmt};
    use crate::middle::ir_gen::IRGenerator;
    use pretty_assertions::assert_eq;

    fn compile(name: &str, functions: Vec<ast::Function>) -> JasminProgram {
        let ir = IRGenerator::new(name).generate(&program(functions)).unwrap();
        JasminCodeGen::new().generate(&ir)
    }

    fn body(program: &JasminProgram, method: &str) -> Vec<String> {
        program
            .method(method)
            .unwrap()
            .statements
            .iter()
            .map(|s| s.to_string().trim_start().to_string())
            .collect()
    }

    #[test]
    fn test_end_to_end_add() {
        let program = compile(
            "Adder",
            vec![
                function(
                    Type::INT,
                    "add",
                    vec![(Type::INT, "a"), (Type::INT, "b")],
                    vec![],
                    vec![ret(Some(binary(BinOp::Add, var("a"), var("b"))))],
                ),
                main_fn(vec![], vec![]),
            ],
        );

        let expected = "\
.method public static add(II)I
\t.limit locals 3
\t.limit stack 5
\t.var 0 is a I from L0 to L1
\t.var 1 is b I from L0 to L1
L0:
\tiload 0
\tiload 1
\tiadd
\tistore 2
\tiload 2
\tireturn
L1:
.end method
";
        assert_eq!(program.method("add").unwrap().to_string(), expected);

        let text = program.to_string();
        assert!(text.starts_with(".source Adder.ul\n.class public Adder\n.super java/lang/Object\n"));
        assert!(text.contains("\tinvokestatic Adder/__main()V\n"));
        assert!(text.contains(".method public static __main()V\n"));
        assert_eq!(body(&program, "__main"), vec!["L0:", "return", "L1:"]);
    }

    #[test]
    fn test_string_concat_uses_buffer() {
        let program = compile(
            "Cat",
            vec![main_fn(vec![], vec![println(binary(BinOp::Add, string("a"), string("b")))])],
        );
        let ops = body(&program, "__main");
        assert!(!ops.iter().any(|l| l == "iadd"));
        assert_eq!(ops.iter().filter(|l| *l == "new java/lang/StringBuffer").count(), 1);
        assert_eq!(ops.iter().filter(|l| l.contains("StringBuffer/append")).count(), 2);
        assert_eq!(ops.iter().filter(|l| l.contains("StringBuffer/toString")).count(), 1);
        assert!(ops.contains(&"invokevirtual java/io/PrintStream/println(Ljava/lang/String;)V".to_string()));
    }

    #[test]
    fn test_return_after_return_is_suppressed() {
        let program = compile(
            "Twice",
            vec![main_fn(vec![], vec![ret(None), ret(None)])],
        );
        assert_eq!(body(&program, "__main"), vec!["L0:", "return", "L1:"]);
    }

    #[test]
    fn test_stack_limit_is_program_wide() {
        let three = (0..3).map(|_| (Type::INT, "p")).collect::<Vec<_>>();
        let program = compile(
            "Stack",
            vec![function(Type::VOID, "f", three, vec![], vec![]), main_fn(vec![], vec![])],
        );
        assert_eq!(program.method("f").unwrap().stack_limit, Some(5));
        assert_eq!(program.method("__main").unwrap().stack_limit, Some(5));

        let five = vec![(Type::INT, "a"), (Type::INT, "b"), (Type::INT, "c"), (Type::INT, "d"), (Type::INT, "e")];
        let program = compile(
            "Stack",
            vec![main_fn(vec![], vec![]), function(Type::VOID, "g", five, vec![], vec![])],
        );
        assert_eq!(program.method("__main").unwrap().stack_limit, Some(7));
    }

    #[test]
    fn test_comparison_labels_avoid_ir_labels() {
        let program = compile(
            "Loop",
            vec![main_fn(
                vec![(Type::INT, "i")],
                vec![while_stmt(binary(BinOp::Less, var("i"), int(3)), vec![])],
            )],
        );
        assert_eq!(
            body(&program, "__main"),
            vec![
                "L2:",
                "L0:",
                "ldc 3",
                "istore 1",
                "iload 0",
                "iload 1",
                "if_icmplt L4",
                "ldc 0",
                "goto L5",
                "L4:",
                "ldc 1",
                "L5:",
                "istore 2",
                "iload 2",
                "ldc 1",
                "ixor",
                "istore 3",
                "iload 3",
                "ifne L1",
                "goto L0",
                "L1:",
                "return",
                "L3:",
            ]
        );
    }

    #[test]
    fn test_boolean_equality_is_branch_free() {
        let program = compile(
            "Eq",
            vec![main_fn(
                vec![(Type::BOOLEAN, "x")],
                vec![assign("x", binary(BinOp::Eq, boolean(true), boolean(false)))],
            )],
        );
        let ops = body(&program, "__main");
        assert_eq!(
            ops[1..ops.len() - 2].to_vec(),
            vec![
                "ldc 1", "istore 1", "ldc 0", "istore 2", "iload 1", "iload 2", "ixor", "ldc 1",
                "ixor", "istore 3", "iload 3", "istore 0",
            ]
        );
    }

    #[test]
    fn test_float_and_string_comparisons() {
        let program = compile(
            "Cmp",
            vec![main_fn(
                vec![],
                vec![
                    println(binary(BinOp::Less, float(1.5), float(2.0))),
                    println(binary(BinOp::Eq, string("a"), string("b"))),
                ],
            )],
        );
        let ops = body(&program, "__main");
        assert!(ops.contains(&"ldc 1.5".to_string()));
        assert!(ops.contains(&"fcmpg".to_string()));
        assert!(!ops.contains(&"fcmpl".to_string()));
        assert!(ops.contains(&"invokevirtual java/lang/String/compareTo(Ljava/lang/String;)I".to_string()));
        assert!(ops.iter().any(|l| l.starts_with("ifeq L")));
        assert!(ops.contains(&"invokevirtual java/io/PrintStream/println(Z)V".to_string()));
    }

    #[test]
    fn test_unreachable_jumps_are_suppressed() {
        let program = compile(
            "Branch",
            vec![
                function(
                    Type::INT,
                    "pick",
                    vec![(Type::BOOLEAN, "c")],
                    vec![],
                    vec![if_stmt(var("c"), vec![ret(Some(int(1)))], Some(vec![ret(Some(int(2)))]))],
                ),
                main_fn(vec![], vec![]),
            ],
        );
        let ops = body(&program, "pick");
        // The GOTO past the else branch follows a return
        assert!(!ops.iter().any(|l| l.starts_with("goto")));
        assert_eq!(ops.iter().filter(|l| *l == "ireturn").count(), 2);
    }

    #[test]
    fn test_arrays() {
        let program = compile(
            "Arr",
            vec![main_fn(
                vec![
                    (Type::array(PrimitiveType::Character, 2), "cs"),
                    (Type::array(PrimitiveType::String, 1), "ss"),
                ],
                vec![
                    array_assign("cs", int(0), chr('A')),
                    array_assign("ss", int(0), index("ss", int(0))),
                ],
            )],
        );
        let method = program.method("__main").unwrap();
        let ops = body(&program, "__main");
        assert_eq!(ops[1..7].to_vec(), vec!["ldc 2", "newarray char", "astore 0", "ldc 1", "anewarray java/lang/String", "astore 1"]);
        assert!(ops.contains(&"ldc 65".to_string()));
        assert!(ops.contains(&"castore".to_string()));
        assert!(ops.contains(&"aaload".to_string()));
        assert!(ops.contains(&"aastore".to_string()));
        assert_eq!(method.variables[0].to_string(), "\t.var 0 is cs [C from L0 to L1");
    }

    #[test]
    fn test_calls_and_main_rename() {
        let program = compile(
            "Calls",
            vec![
                main_fn(vec![], vec![Stmt::Expr(call("twice", vec![int(2)])), print(call("twice", vec![int(3)]))]),
                function(Type::INT, "twice", vec![(Type::INT, "n")], vec![], vec![ret(Some(binary(BinOp::Mul, var("n"), int(2))))]),
                function(Type::VOID, "again", vec![], vec![], vec![Stmt::Expr(call("main", vec![]))]),
            ],
        );
        let main_ops = body(&program, "__main");
        assert_eq!(main_ops.iter().filter(|l| *l == "invokestatic Calls/twice(I)I").count(), 2);
        assert!(body(&program, "again").contains(&"invokestatic Calls/__main()V".to_string()));
        assert!(body(&program, "twice").contains(&"imul".to_string()));
    }

    #[test]
    fn test_constants() {
        let program = compile(
            "Consts",
            vec![main_fn(
                vec![],
                vec![print(boolean(true)), print(string("say \"hi\"\n")), print(float(3.0))],
            )],
        );
        let ops = body(&program, "__main");
        assert!(ops.contains(&"ldc 1".to_string()));
        assert!(ops.contains(&"ldc \"say \\\"hi\\\"\\n\"".to_string()));
        assert!(ops.contains(&"ldc 3.0".to_string()));
        assert!(ops.contains(&"fload 2".to_string()));
    }

    #[test]
    fn test_int_less_than_does_not_wrap() {
        let program = compile(
            "Wrap",
            vec![main_fn(
                vec![(Type::BOOLEAN, "b")],
                vec![
                    assign("b", binary(BinOp::Less, int(i32::MAX), int(-1))),
                    assign("b", binary(BinOp::Eq, chr('a'), chr('b'))),
                ],
            )],
        );
        let ops = body(&program, "__main");
        assert!(!ops.iter().any(|l| l == "isub"));
        assert!(ops.contains(&"ldc 2147483647".to_string()));
        let less = ops.iter().position(|l| l.starts_with("if_icmplt L")).unwrap();
        assert!(ops[less - 2].starts_with("iload ") && ops[less - 1].starts_with("iload "));
        assert!(ops.iter().any(|l| l.starts_with("if_icmpeq L")));
    }

    #[test]
    fn test_float_equality_keeps_fcmpl() {
        let program = compile(
            "FloatEq",
            vec![main_fn(vec![], vec![println(binary(BinOp::Eq, float(0.5), float(0.5)))])],
        );
        let ops = body(&program, "__main");
        let cmp = ops.iter().position(|l| l == "fcmpl").unwrap();
        assert!(ops[cmp + 1].starts_with("ifeq L"));
    }

    #[test]
    fn test_float_literals_keep_a_fraction() {
        assert_eq!(float_literal(1e20), "100000000000000000000.0");
        assert_eq!(float_literal(2.5), "2.5");
        assert_eq!(float_literal(-3.0), "-3.0");
        assert_eq!(float_literal(1e-7), "0.0000001");
    }

    #[test]
    fn test_char_arithmetic_narrows() {
        let program = compile(
            "Chars",
            vec![main_fn(vec![], vec![print(binary(BinOp::Add, chr('a'), chr('b')))])],
        );
        let ops = body(&program, "__main");
        let add = ops.iter().position(|l| l == "iadd").unwrap();
        assert_eq!(ops[add + 1], "i2c");
        assert!(ops.contains(&"invokevirtual java/io/PrintStream/print(C)V".to_string()));
    }

    #[test]
    #[should_panic(expected = "no instruction for `-`")]
    fn test_unsupported_operator_panics() {
        let mut ctx = MethodContext::new("X", LabelFactory::new());
        let s = Temporary { kind: TempKind::True, local_index: 0, group_offset: 0, ty: Type::STRING, alias: None };
        ctx.binary(BinOp::Sub, &s, &s);
    }

    #[test]
    fn test_backend_identity() {
        let gen = JasminCodeGen::new();
        assert_eq!(gen.name(), "jasmin");
        assert_eq!(gen.file_extension(), "j");
    }
}
