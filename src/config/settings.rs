//! Configuration settings for SortCopy
//!
//! Defines CLI arguments, defaults, and the runtime configuration
//! derived from them.

use crate::error::{Result, SortCopyError};
use clap::{ArgAction, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of copies allowed in flight at once
pub const DEFAULT_CONCURRENCY: usize = 128;

/// SortCopy - copy a directory tree into folders named by file extension
#[derive(Parser, Debug, Clone)]
#[command(name = "sortcopy")]
#[command(author = "SortCopy Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Concurrently copy files into folders named by their extension")]
#[command(long_about = r#"
SortCopy walks SOURCE recursively and copies every regular file into
DESTINATION/<extension>/<file name>. Files without an extension go into
DESTINATION/no_extension.

Examples:
  sortcopy ~/Downloads ~/Sorted               # Basic run
  sortcopy ./src ./out -j 16                  # At most 16 copies in flight
  sortcopy ./src ./out --summary json         # Print a JSON report at the end
  RUST_LOG=debug sortcopy ./src ./out         # Verbose logging
"#)]
pub struct CliArgs {
    /// Directory to scan
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Directory to copy into (created if missing)
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Maximum number of copies in flight
    #[arg(
        short = 'j',
        long,
        env = "SORTCOPY_CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY,
        value_name = "NUM"
    )]
    pub concurrency: usize,

    /// Do not copy modification and access times
    #[arg(long)]
    pub no_preserve: bool,

    /// Descend into symlinked directories while scanning
    #[arg(short = 'L', long)]
    pub follow_symlinks: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Quiet mode (only log errors)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Log line format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Print a summary once every copy has finished
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub summary: Option<OutputFormat>,
}

impl CliArgs {
    /// Log level directive implied by -v/-q
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Log line format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Output format for the run summary
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortConfig {
    /// Source directory
    pub source: PathBuf,
    /// Destination root
    pub destination: PathBuf,
    /// Maximum copies in flight
    pub concurrency: usize,
    /// Preserve timestamps
    pub preserve: bool,
    /// Descend into symlinked directories
    pub follow_symlinks: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            concurrency: DEFAULT_CONCURRENCY,
            preserve: true,
            follow_symlinks: false,
        }
    }
}

impl SortConfig {
    /// Create config from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self> {
        let config = Self {
            source: args.source.clone(),
            destination: args.destination.clone(),
            concurrency: args.concurrency,
            preserve: !args.no_preserve,
            follow_symlinks: args.follow_symlinks,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(SortCopyError::config("concurrency must be at least 1"));
        }
        if self.source.as_os_str().is_empty() {
            return Err(SortCopyError::config("source path is empty"));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(SortCopyError::config("destination path is empty"));
        }
        Ok(())
    }
}
