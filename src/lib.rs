//! # SortCopy - Sort a Directory Tree by File Extension
//!
//! SortCopy walks a source directory recursively and copies every regular
//! file into `destination/<extension>/<file name>`. Files without an
//! extension land in `destination/no_extension`. Copies run concurrently on
//! tokio's blocking pool, and one file failing never stops the others.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sortcopy::core::sort_directory;
//! use std::path::Path;
//!
//! # async fn example() -> sortcopy::Result<()> {
//! let report = sort_directory(Path::new("/source"), Path::new("/sorted")).await?;
//! println!("Copied {} files into {} buckets", report.files_copied(), report.buckets().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Settings
//!
//! ```no_run
//! use sortcopy::config::SortConfig;
//! use sortcopy::core::SortEngine;
//! use std::path::PathBuf;
//!
//! # async fn example() -> sortcopy::Result<()> {
//! let config = SortConfig {
//!     source: PathBuf::from("/source"),
//!     destination: PathBuf::from("/sorted"),
//!     concurrency: 16,
//!     preserve: false,
//!     ..Default::default()
//! };
//!
//! let report = SortEngine::new(config).execute().await?;
//! for failure in report.failures() {
//!     eprintln!("{:?}", failure);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Classification
//!
//! ```
//! use sortcopy::fs::{classify, NO_EXTENSION};
//!
//! assert_eq!(classify("archive.tar.gz"), "gz");
//! assert_eq!(classify("README"), NO_EXTENSION);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod fs;

// Re-export commonly used types
pub use config::SortConfig;
pub use core::{sort_directory, SortEngine, SortReport};
pub use error::{Result, SortCopyError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use sortcopy::prelude::*;
    //! ```

    pub use crate::config::{SortConfig, DEFAULT_CONCURRENCY};
    pub use crate::core::{sort_directory, CopyOutcome, Dispatcher, ItemResult, SortEngine, SortReport};
    pub use crate::error::{Result, SortCopyError};
    pub use crate::fs::{classify, DestinationLayout, WalkConfig, Walker, WorkItem, NO_EXTENSION};
}
