//! Jasmin program model
//!
//! Structured output of the code generator. `Display` renders assembler
//! text; persistence lives in the writer.

use std::fmt;

use crate::middle::ir::Label;
use crate::types::{MethodType, PrimitiveType, Type};

/// Operand stack floor for every user method
pub const MIN_STACK_LIMIT: u32 = 5;

/// `Class/name(desc)` reference used by `invokestatic`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub is_static: bool,
    pub name: String,
    pub ty: MethodType,
}

impl MethodSignature {
    pub fn new_static(name: &str, ty: MethodType) -> Self {
        Self { is_static: true, name: name.to_string(), ty }
    }

    /// `name(desc)` as it appears after `.method`
    pub fn declaration(&self) -> String {
        format!("{}{}", self.name, self.ty.jasmin_descriptor())
    }
}

/// One line inside a method body
#[derive(Debug, Clone, PartialEq)]
pub enum JasminStatement {
    Instruction { opcode: String, operand: Option<String> },
    /// `invokestatic <class>/<name><desc>`
    Call { class: String, target: MethodSignature },
    Label(Label),
}

impl JasminStatement {
    pub fn op(opcode: &str) -> Self {
        Self::Instruction { opcode: opcode.to_string(), operand: None }
    }

    pub fn op_with(opcode: &str, operand: impl fmt::Display) -> Self {
        Self::Instruction { opcode: opcode.to_string(), operand: Some(operand.to_string()) }
    }
}

impl fmt::Display for JasminStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instruction { opcode, operand: Some(operand) } => write!(f, "\t{} {}", opcode, operand),
            Self::Instruction { opcode, operand: None } => write!(f, "\t{}", opcode),
            Self::Call { class, target } => {
                write!(f, "\tinvokestatic {}/{}", class, target.declaration())
            }
            Self::Label(label) => write!(f, "{}:", label),
        }
    }
}

/// `.var <n> is <name> <desc> from <start> to <end>`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub slot: u32,
    pub name: String,
    pub ty: Type,
    pub start: Label,
    pub end: Label,
}

impl fmt::Display for VariableDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\t.var {} is {} {} from {} to {}",
            self.slot,
            self.name,
            self.ty.jasmin_descriptor(),
            self.start,
            self.end
        )
    }
}

/// A `.method` block
#[derive(Debug, Clone, PartialEq)]
pub struct JasminMethod {
    pub signature: MethodSignature,
    pub locals_limit: Option<u32>,
    pub stack_limit: Option<u32>,
    pub variables: Vec<VariableDeclaration>,
    pub statements: Vec<JasminStatement>,
}

impl JasminMethod {
    /// Public no-argument constructor delegating to `java/lang/Object`
    pub fn constructor() -> Self {
        Self {
            signature: MethodSignature {
                is_static: false,
                name: "<init>".to_string(),
                ty: MethodType::default(),
            },
            locals_limit: None,
            stack_limit: None,
            variables: Vec::new(),
            statements: vec![
                JasminStatement::op("aload_0"),
                JasminStatement::op_with("invokenonvirtual", "java/lang/Object/<init>()V"),
                JasminStatement::op("return"),
            ],
        }
    }

    /// `main([Ljava/lang/String;)V` forwarding to the user entry point
    pub fn entry_point(class: &str, user_main: &str) -> Self {
        Self {
            signature: MethodSignature {
                is_static: true,
                name: "main".to_string(),
                ty: MethodType::new(vec![Type::array(PrimitiveType::String, 0)], Type::VOID),
            },
            locals_limit: Some(1),
            stack_limit: None,
            variables: Vec::new(),
            statements: vec![
                JasminStatement::Call {
                    class: class.to_string(),
                    target: MethodSignature::new_static(user_main, MethodType::default()),
                },
                JasminStatement::op("return"),
            ],
        }
    }
}

impl fmt::Display for JasminMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifier = if self.signature.is_static { "public static" } else { "public" };
        writeln!(f, ".method {} {}", modifier, self.signature.declaration())?;
        if let Some(locals) = self.locals_limit {
            writeln!(f, "\t.limit locals {}", locals)?;
        }
        if let Some(stack) = self.stack_limit {
            writeln!(f, "\t.limit stack {}", stack)?;
        }
        for var in &self.variables {
            writeln!(f, "{}", var)?;
        }
        for stmt in &self.statements {
            writeln!(f, "{}", stmt)?;
        }
        writeln!(f, ".end method")
    }
}

/// A whole class
#[derive(Debug, Clone, PartialEq)]
pub struct JasminProgram {
    pub class_name: String,
    pub source_file: String,
    pub methods: Vec<JasminMethod>,
}

impl JasminProgram {
    pub fn method(&self, name: &str) -> Option<&JasminMethod> {
        self.methods.iter().find(|m| m.signature.name == name)
    }
}

impl fmt::Display for JasminProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ".source {}", self.source_file)?;
        writeln!(f, ".class public {}", self.class_name)?;
        writeln!(f, ".super java/lang/Object")?;
        for method in &self.methods {
            writeln!(f)?;
            write!(f, "{}", method)?;
        }
        Ok(())
    }
}
