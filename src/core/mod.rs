//! Core sort engine module
//!
//! Provides the concurrent copy dispatcher and the top-level
//! orchestration that feeds it from the source walker.

mod dispatcher;
mod sorter;

pub use dispatcher::*;
pub use sorter::*;
