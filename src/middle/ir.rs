//! UL IR definitions
//!
//! A flat, per-function instruction list over typed temporaries and labels.
//! `Display` on every item produces the textual IR format.

use std::fmt;

use crate::types::{MethodType, PrimitiveType, Type};

pub use crate::frontend::ast::BinOp;

// ==================== Temporaries ====================

/// Temporary groups, in the order their index ranges appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TempKind {
    Parameter,
    Local,
    True,
}

/// A typed IR storage location, written `T<global index>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Temporary {
    pub kind: TempKind,
    /// Position within its kind's range
    pub local_index: u32,
    /// Start of its kind's range
    pub group_offset: u32,
    pub ty: Type,
    /// Source identifier for parameters and locals
    pub alias: Option<String>,
}

impl Temporary {
    pub fn global_index(&self) -> u32 {
        self.group_offset + self.local_index
    }

    /// Alias decorated with the kind, e.g. `P("a")`
    pub fn decorated_alias(&self) -> Option<String> {
        let alias = self.alias.as_ref()?;
        match self.kind {
            TempKind::Parameter => Some(format!("P(\"{}\")", alias)),
            TempKind::Local => Some(format!("L(\"{}\")", alias)),
            TempKind::True => None,
        }
    }

    /// Declaration line for the IR text format
    pub fn declaration(&self) -> String {
        match self.decorated_alias() {
            Some(alias) => format!("TEMP {}:{} [{}];", self.global_index(), self.ty.ir_string(), alias),
            None => format!("TEMP {}:{};", self.global_index(), self.ty.ir_string()),
        }
    }
}

impl fmt::Display for Temporary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.global_index())
    }
}

// ==================== Labels ====================

/// Jump target, unique within one function
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Hands out labels with increasing indices
#[derive(Debug, Clone, Default)]
pub struct LabelFactory {
    next: u32,
}

impl LabelFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start numbering at `first` instead of 0
    pub fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    pub fn next_label(&mut self) -> Label {
        let label = Label(self.next);
        self.next += 1;
        label
    }

    pub fn clear(&mut self) {
        self.next = 0;
    }
}

// ==================== Expressions ====================

/// Constant value
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Boolean(bool),
    Integer(i32),
    Float(f32),
    Character(char),
    String(String),
}

impl Constant {
    pub fn ty(&self) -> Type {
        match self {
            Constant::Boolean(_) => Type::BOOLEAN,
            Constant::Integer(_) => Type::INT,
            Constant::Float(_) => Type::FLOAT,
            Constant::Character(_) => Type::CHAR,
            Constant::String(_) => Type::STRING,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Constant::Integer(n) => write!(f, "{}", n),
            Constant::Float(n) => write!(f, "{:?}", n),
            Constant::Character(c) => write!(f, "'{}'", c),
            Constant::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// `array[index]`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAccess {
    pub array: Temporary,
    pub index: Temporary,
}

impl ArrayAccess {
    pub fn element_type(&self) -> Type {
        self.array.ty.element().unwrap_or(Type::VOID)
    }
}

impl fmt::Display for ArrayAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.array, self.index)
    }
}

/// `CALL f(T0 T1)`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Temporary>,
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(|t| t.to_string()).collect();
        write!(f, "CALL {}({})", self.name, args.join(" "))
    }
}

/// Anything that can appear on the right of `T := ...`
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Constant(Constant),
    /// Copy of another temporary
    Temp(Temporary),
    /// Both operands share one type
    Binary {
        op: BinOp,
        left: Temporary,
        right: Temporary,
    },
    /// Logical negation of a boolean
    Not(Temporary),
    ArrayAccess(ArrayAccess),
    NewArray { element: PrimitiveType, size: u32 },
    Call(FunctionCall),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(c) => write!(f, "{}", c),
            Expression::Temp(t) => write!(f, "{}", t),
            Expression::Binary { op, left, right } => {
                write!(f, "{} {}{} {}", left, left.ty.ir_string(), op.symbol(), right)
            }
            Expression::Not(t) => write!(f, "{}! {}", t.ty.ir_string(), t),
            Expression::ArrayAccess(access) => write!(f, "{}", access),
            Expression::NewArray { element, size } => {
                write!(f, "NEWARRAY {} {}", element.ir_code(), size)
            }
            Expression::Call(call) => write!(f, "{}", call),
        }
    }
}

// ==================== Instructions ====================

/// IR Instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// dest := value
    Assign { dest: Temporary, value: Expression },

    /// array[index] := value
    ArrayAssign { access: ArrayAccess, value: Temporary },

    /// GOTO target
    Jump(Label),

    /// IF cond GOTO target
    CondJump { cond: Temporary, target: Label },

    /// target:
    Label(Label),

    /// Call without a result
    Call(FunctionCall),

    Return(Option<Temporary>),

    Print(Temporary),

    Println(Temporary),
}

impl Instruction {
    /// Label referenced or defined by this instruction
    pub fn label(&self) -> Option<Label> {
        match self {
            Instruction::Jump(label)
            | Instruction::CondJump { target: label, .. }
            | Instruction::Label(label) => Some(*label),
            _ => None,
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, Instruction::Return(_))
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Assign { dest, value } => write!(f, "{} := {};", dest, value),
            Instruction::ArrayAssign { access, value } => write!(f, "{} := {};", access, value),
            Instruction::Jump(label) => write!(f, "GOTO {};", label),
            Instruction::CondJump { cond, target } => write!(f, "IF {} GOTO {};", cond, target),
            Instruction::Label(label) => write!(f, "{}:;", label),
            Instruction::Call(call) => write!(f, "{};", call),
            Instruction::Return(Some(t)) => write!(f, "RETURN {};", t),
            Instruction::Return(None) => write!(f, "RETURN;"),
            Instruction::Print(t) => write!(f, "PRINT{} {};", t.ty.ir_string(), t),
            Instruction::Println(t) => write!(f, "PRINTLN{} {};", t.ty.ir_string(), t),
        }
    }
}

// ==================== Functions and Programs ====================

/// IR Function
#[derive(Debug, Clone, PartialEq)]
pub struct IRFunction {
    pub name: String,
    pub ty: MethodType,
    pub temps: Vec<Temporary>,
    pub instructions: Vec<Instruction>,
}

impl IRFunction {
    /// Highest label index used, if any
    pub fn max_label(&self) -> Option<u32> {
        self.instructions
            .iter()
            .filter_map(|inst| inst.label())
            .map(|label| label.0)
            .max()
    }
}

/// Accumulates one function
#[derive(Debug, Clone)]
pub struct IRFunctionBuilder {
    name: String,
    ty: MethodType,
    instructions: Vec<Instruction>,
}

impl IRFunctionBuilder {
    pub fn new(name: &str, ty: MethodType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    pub fn last(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    pub fn build(self, temps: Vec<Temporary>) -> IRFunction {
        IRFunction {
            name: self.name,
            ty: self.ty,
            temps,
            instructions: self.instructions,
        }
    }
}

/// IR Program - functions in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct IRProgram {
    pub name: String,
    pub functions: Vec<IRFunction>,
}

/// Accumulates a program
#[derive(Debug, Clone)]
pub struct IRProgramBuilder {
    name: String,
    functions: Vec<IRFunction>,
}

impl IRProgramBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            functions: Vec::new(),
        }
    }

    pub fn add_function(&mut self, func: IRFunction) {
        self.functions.push(func);
    }

    pub fn build(self) -> IRProgram {
        IRProgram {
            name: self.name,
            functions: self.functions,
        }
    }
}
