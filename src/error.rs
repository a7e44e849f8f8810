//! Error types for SortCopy
//!
//! Errors fall into three groups: precondition failures detected before any
//! work starts, structural failures of the directory traversal itself, and
//! per-item copy failures. Only the first two can end a run early.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for SortCopy operations
#[derive(Error, Debug)]
pub enum SortCopyError {
    /// Source path is missing or is not a directory
    #[error("Source directory does not exist or is not a directory: {0}")]
    SourceNotDirectory(PathBuf),

    /// Traversal of the source tree failed
    #[error("Failed to enumerate '{path}': {source}")]
    Enumeration {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// I/O error during a copy or directory creation
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A copy worker panicked, or a blocking task did not complete
    #[error("Task for '{path}' did not complete: {message}")]
    TaskFailed { path: PathBuf, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Run report could not be rendered
    #[error("Report error: {0}")]
    ReportError(String),
}

impl SortCopyError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an enumeration error, falling back to `root` when walkdir
    /// does not report the failing path
    pub fn enumeration(root: &Path, source: walkdir::Error) -> Self {
        let path = source
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());
        Self::Enumeration { path, source }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Errors that abort the whole run rather than a single item
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Enumeration { .. } | Self::ConfigError(_))
    }

    /// Errors detected before any filesystem change was made
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::SourceNotDirectory(_))
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SourceNotDirectory(path)
            | Self::Enumeration { path, .. }
            | Self::Io { path, .. }
            | Self::TaskFailed { path, .. } => Some(path),
            Self::ConfigError(_) | Self::ReportError(_) => None,
        }
    }
}

/// Result type alias for SortCopy operations
pub type Result<T> = std::result::Result<T, SortCopyError>;

impl From<serde_json::Error> for SortCopyError {
    fn from(err: serde_json::Error) -> Self {
        SortCopyError::ReportError(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| SortCopyError::io(path, e))
    }
}
