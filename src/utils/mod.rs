//! Utility module

mod span;
mod error;
pub mod environment;

pub use span::Span;
pub use error::{Error, Result};
pub use environment::Environment;
