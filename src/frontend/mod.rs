//! Frontend module - AST, Semantic Analysis, Pretty Printing

pub mod ast;
pub mod pretty;
pub mod semantic;
