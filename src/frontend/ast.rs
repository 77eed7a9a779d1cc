//! Abstract Syntax Tree definitions for UL
//!
//! The tree is produced by the external front end (and arrives here as JSON);
//! it is structurally valid but not yet type checked.

use serde::{Deserialize, Serialize};

use crate::types::Type;
use crate::utils::Span;

/// A complete program (compilation unit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub functions: Vec<Function>,
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub decl: FunctionDecl,
    pub body: FunctionBody,
}

/// Function signature: return type, name and formals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub ret_type: TypeNode,
    pub name: Ident,
    pub formals: Vec<FormalParameter>,
}

impl FunctionDecl {
    pub fn span(&self) -> Span {
        self.ret_type.span
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormalParameter {
    pub ty: TypeNode,
    pub name: Ident,
}

/// A type as written in the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    pub ty: Type,
    pub span: Span,
}

/// Identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

/// Local declarations followed by statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionBody {
    pub declarations: Vec<VariableDeclaration>,
    pub statements: Vec<Stmt>,
}

/// Local variable declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub ty: TypeNode,
    pub name: Ident,
}

/// A braced statement list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `expr;`
    Expr(Expr),

    /// `print expr;`
    Print { expr: Expr, span: Span },

    /// `println expr;`
    Println { expr: Expr, span: Span },

    /// `return [expr];`
    Return { value: Option<Expr>, span: Span },

    /// `id = expr;`
    Assign { target: Ident, value: Expr },

    /// `id[index] = expr;`
    ArrayAssign {
        array: Ident,
        index: Expr,
        value: Expr,
    },

    /// `if (cond) block [else block]`
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
        span: Span,
    },

    /// `while (cond) block`
    While { cond: Expr, body: Block, span: Span },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Expr(expr) => expr.span(),
            Stmt::Print { span, .. }
            | Stmt::Println { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. } => *span,
            Stmt::Assign { target, .. } => target.span,
            Stmt::ArrayAssign { array, .. } => array.span,
        }
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal { value: Literal, span: Span },
    Ident(Ident),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Paren { inner: Box<Expr>, span: Span },
    Call { name: Ident, args: Vec<Expr> },
    Index { array: Ident, index: Box<Expr> },
}

impl Expr {
    /// Position of the expression. Binary expressions report their left operand.
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. } | Expr::Paren { span, .. } => *span,
            Expr::Ident(ident) => ident.span,
            Expr::Binary { left, .. } => left.span(),
            Expr::Call { name, .. } => name.span,
            Expr::Index { array, .. } => array.span,
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i32),
    Float(f32),
    Bool(bool),
    Char(char),
    String(String),
}

impl Literal {
    pub fn ty(&self) -> Type {
        match self {
            Literal::Int(_) => Type::INT,
            Literal::Float(_) => Type::FLOAT,
            Literal::Bool(_) => Type::BOOLEAN,
            Literal::Char(_) => Type::CHAR,
            Literal::String(_) => Type::STRING,
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Less,
    Eq,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Less => "<",
            BinOp::Eq => "==",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, BinOp::Less | BinOp::Eq)
    }

    /// Whether the operator is defined over operands of type `ty`.
    pub fn accepts(&self, ty: &Type) -> bool {
        let numeric = *ty == Type::INT || *ty == Type::FLOAT || *ty == Type::CHAR;
        match self {
            BinOp::Add => numeric || *ty == Type::STRING,
            BinOp::Sub | BinOp::Mul => numeric,
            BinOp::Less => numeric || *ty == Type::STRING,
            // Arrays are not comparable
            BinOp::Eq => ty.is_printable(),
        }
    }

    /// Result type for operands of type `operand`
    pub fn result_type(&self, operand: Type) -> Type {
        if self.is_comparison() {
            Type::BOOLEAN
        } else {
            operand
        }
    }
}
