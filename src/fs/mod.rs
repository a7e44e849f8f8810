//! File system operations module
//!
//! Provides the lazy source walker with extension classification and the
//! blocking bucket copy used by the dispatcher.

mod operations;
mod scanner;

pub use operations::*;
pub use scanner::*;
