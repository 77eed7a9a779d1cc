//! Semantic Analysis for UL
//!
//! Performs:
//! - Function signature collection (forward and mutual calls)
//! - `main` validation
//! - Scope checking of formals, locals and references
//! - Type checking of every expression and statement
//!
//! Stops at the first violation.

use log::{debug, trace};

use crate::frontend::ast::*;
use crate::types::Type;
use crate::utils::{Environment, Error, Result, Span};

/// JVM method name the user's `main` is emitted under. No user function
/// may take it.
pub const MAIN_ALIAS: &str = "__main";

// ==================== Symbols ====================

/// Declared signature of a function
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
    pub span: Span,
}

impl Signature {
    fn of(decl: &FunctionDecl) -> Self {
        Self {
            params: decl.formals.iter().map(|f| f.ty.ty).collect(),
            ret: decl.ret_type.ty,
            span: decl.span(),
        }
    }
}

// ==================== Semantic Analyzer ====================

/// Semantic analyzer
pub struct SemanticAnalyzer {
    variables: Environment<String, Type>,
    functions: Environment<String, Signature>,
    /// Return type of the function being checked
    current_ret: Option<Type>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            variables: Environment::new(),
            functions: Environment::new(),
            current_ret: None,
        }
    }

    /// Analyze a program
    pub fn analyze(&mut self, program: &Program) -> Result<()> {
        // Pass 1: Collect all function signatures
        for func in &program.functions {
            let name = &func.decl.name;
            if name.name == MAIN_ALIAS {
                return Err(Error::ReservedFunctionName {
                    name: name.name.clone(),
                    span: Some(name.span),
                });
            }
            if self.functions.exists(&name.name) {
                return Err(Error::DuplicateFunction {
                    name: name.name.clone(),
                    span: Some(name.span),
                });
            }
            self.functions.bind(name.name.clone(), Signature::of(&func.decl));
        }

        self.check_main()?;

        // Pass 2: Type check all bodies
        for func in &program.functions {
            self.check_function(func)?;
        }

        Ok(())
    }

    fn check_main(&self) -> Result<()> {
        let main = self.functions.lookup(&"main".to_string()).ok_or(Error::MissingMain)?;

        if !main.ret.is_void() {
            return Err(Error::InvalidMain {
                reason: format!("return type '{}' but expected 'void'", main.ret),
                span: Some(main.span),
            });
        }
        if !main.params.is_empty() {
            return Err(Error::InvalidMain {
                reason: "main() must not take formal parameters".to_string(),
                span: Some(main.span),
            });
        }
        Ok(())
    }

    /// Type check a function
    fn check_function(&mut self, func: &Function) -> Result<()> {
        debug!("checking function '{}'", func.decl.name.name);

        self.variables.enter_scope();
        self.check_type_node(&func.decl.ret_type)?;

        for formal in &func.decl.formals {
            let name = &formal.name;
            let ty = self.check_type_node(&formal.ty)?;
            if ty.is_void() {
                return Err(Error::VoidParameter {
                    name: name.name.clone(),
                    span: Some(formal.ty.span),
                });
            }
            if self.variables.exists_in_current_scope(&name.name) {
                return Err(Error::DuplicateParameter {
                    name: name.name.clone(),
                    span: Some(name.span),
                });
            }
            self.variables.bind(name.name.clone(), ty);
        }

        self.current_ret = Some(func.decl.ret_type.ty);
        let result = self.check_body(&func.body);
        self.current_ret = None;

        self.variables.exit_scope().expect("unbalanced scope");
        result
    }

    fn check_body(&mut self, body: &FunctionBody) -> Result<()> {
        for decl in &body.declarations {
            let name = &decl.name;
            let ty = self.check_type_node(&decl.ty)?;
            if ty.is_void() {
                return Err(Error::VoidVariable {
                    name: name.name.clone(),
                    span: Some(decl.ty.span),
                });
            }
            // Locals may not shadow formals or each other
            if self.variables.exists_in_current_scope(&name.name) {
                return Err(Error::DuplicateVariable {
                    name: name.name.clone(),
                    span: Some(name.span),
                });
            }
            self.variables.bind(name.name.clone(), ty);
        }

        for stmt in &body.statements {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_type_node(&self, node: &TypeNode) -> Result<Type> {
        match node.ty {
            Type::Array { element, .. } if Type::Primitive(element).is_void() => {
                Err(Error::VoidArrayElement { span: Some(node.span) })
            }
            ty => Ok(ty),
        }
    }

    fn check_block(&mut self, block: &Block) -> Result<()> {
        self.variables.enter_scope();
        let result = block.statements.iter().try_for_each(|stmt| self.check_stmt(stmt));
        self.variables.exit_scope().expect("unbalanced scope");
        result
    }

    /// Type check a statement
    fn check_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        trace!("checking statement at {}", stmt.span());
        match stmt {
            Stmt::Expr(expr) => {
                self.check_expr(expr)?;
            }

            Stmt::Print { expr, .. } | Stmt::Println { expr, .. } => {
                let ty = self.check_expr(expr)?;
                if !ty.is_printable() {
                    return Err(Error::UnprintableType { ty, span: Some(expr.span()) });
                }
            }

            Stmt::Return { value, span } => {
                let expected = self.current_ret.unwrap_or(Type::VOID);
                match value {
                    Some(expr) => {
                        let found = self.check_expr(expr)?;
                        if expected.is_void() {
                            return Err(Error::ReturnValueFromVoid { span: Some(expr.span()) });
                        }
                        expect_type(expected, found, expr.span())?;
                    }
                    None if !expected.is_void() => {
                        return Err(Error::EmptyReturn { span: Some(*span) });
                    }
                    None => {}
                }
            }

            Stmt::Assign { target, value } => {
                let expected = self.lookup_variable(target)?;
                let found = self.check_expr(value)?;
                expect_type(expected, found, value.span())?;
            }

            Stmt::ArrayAssign { array, index, value } => {
                let element = self.check_indexing(array, index)?;
                let found = self.check_expr(value)?;
                expect_type(element, found, value.span())?;
            }

            Stmt::If { cond, then_block, else_block, .. } => {
                self.check_condition(cond)?;
                self.check_block(then_block)?;
                if let Some(else_block) = else_block {
                    self.check_block(else_block)?;
                }
            }

            Stmt::While { cond, body, .. } => {
                self.check_condition(cond)?;
                self.check_block(body)?;
            }
        }
        Ok(())
    }

    fn check_condition(&mut self, cond: &Expr) -> Result<()> {
        let ty = self.check_expr(cond)?;
        expect_type(Type::BOOLEAN, ty, cond.span())
    }

    /// Type check an expression and return its type
    fn check_expr(&mut self, expr: &Expr) -> Result<Type> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.ty()),

            Expr::Ident(ident) => self.lookup_variable(ident),

            Expr::Paren { inner, .. } => self.check_expr(inner),

            Expr::Binary { op, left, right } => {
                let left_ty = self.check_expr(left)?;
                let right_ty = self.check_expr(right)?;
                if !op.accepts(&left_ty) {
                    return Err(Error::InvalidOperandType {
                        op: op.symbol().to_string(),
                        ty: left_ty,
                        span: Some(left.span()),
                    });
                }
                expect_type(left_ty, right_ty, right.span())?;
                Ok(op.result_type(left_ty))
            }

            Expr::Call { name, args } => {
                let sig = self
                    .functions
                    .lookup(&name.name)
                    .cloned()
                    .ok_or_else(|| Error::UndefinedFunction {
                        name: name.name.clone(),
                        span: Some(name.span),
                    })?;

                if sig.params.len() != args.len() {
                    return Err(Error::ArgCountMismatch {
                        name: name.name.clone(),
                        expected: sig.params.len(),
                        got: args.len(),
                        span: Some(name.span),
                    });
                }

                for (expected, arg) in sig.params.iter().zip(args) {
                    let found = self.check_expr(arg)?;
                    expect_type(*expected, found, arg.span())?;
                }
                Ok(sig.ret)
            }

            Expr::Index { array, index } => self.check_indexing(array, index),
        }
    }

    /// Check `array[index]` and return the element type
    fn check_indexing(&mut self, array: &Ident, index: &Expr) -> Result<Type> {
        let array_ty = self.lookup_variable(array)?;
        let element = array_ty.element().ok_or_else(|| Error::NonArrayIndex {
            name: array.name.clone(),
            ty: array_ty,
            span: Some(array.span),
        })?;

        let index_ty = self.check_expr(index)?;
        if !index_ty.is_int() {
            return Err(Error::InvalidIndex { ty: index_ty, span: Some(index.span()) });
        }
        Ok(element)
    }

    fn lookup_variable(&self, ident: &Ident) -> Result<Type> {
        self.variables
            .lookup(&ident.name)
            .copied()
            .ok_or_else(|| Error::UndefinedVariable {
                name: ident.name.clone(),
                span: Some(ident.span),
            })
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Types must match exactly; there is no implicit coercion.
fn expect_type(expected: Type, found: Type, span: Span) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::TypeMismatch { expected, found, span: Some(span) })
    }
}
