//! Top-level sort engine
//!
//! Resolves and validates paths, walks the source tree on the blocking pool,
//! and hands every file found to the [`Dispatcher`].

use crate::config::{OutputFormat, SortConfig};
use crate::core::{CopyOutcome, Dispatcher, ItemResult};
use crate::error::{IoResultExt, Result, SortCopyError};
use crate::fs::{CopyOptions, DestinationLayout, WalkConfig, Walker, WorkItem};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of a completed run
#[derive(Debug)]
pub struct SortReport {
    /// Absolute source root
    pub source: PathBuf,
    /// Absolute destination root
    pub destination: PathBuf,
    /// One outcome per file found
    pub outcomes: Vec<CopyOutcome>,
    /// Wall-clock duration
    pub duration: Duration,
}

#[derive(Serialize)]
struct ReportSummary<'a> {
    source: &'a Path,
    destination: &'a Path,
    files_copied: usize,
    bytes_copied: u64,
    buckets: Vec<&'a str>,
    duration_secs: f64,
    failures: Vec<&'a CopyOutcome>,
}

impl SortReport {
    /// Number of files copied
    pub fn files_copied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_copied()).count()
    }

    /// Total bytes written
    pub fn bytes_copied(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.result {
                ItemResult::Copied { bytes, .. } => bytes,
                ItemResult::Failed { .. } => 0,
            })
            .sum()
    }

    /// Items whose copy failed
    pub fn failures(&self) -> impl Iterator<Item = &CopyOutcome> {
        self.outcomes.iter().filter(|o| !o.is_copied())
    }

    /// Distinct buckets that received at least one file
    pub fn buckets(&self) -> BTreeSet<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_copied())
            .map(|o| o.item.bucket())
            .collect()
    }

    /// Check if every file was copied
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    fn summary(&self) -> ReportSummary<'_> {
        ReportSummary {
            source: &self.source,
            destination: &self.destination,
            files_copied: self.files_copied(),
            bytes_copied: self.bytes_copied(),
            buckets: self.buckets().into_iter().collect(),
            duration_secs: self.duration.as_secs_f64(),
            failures: self.failures().collect(),
        }
    }

    /// Render the summary as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.summary())?)
    }

    /// Print summary to stdout
    pub fn print_summary(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Json => println!("{}", self.to_json()?),
            OutputFormat::Text => {
                println!("\n=== Sort Summary ===");
                println!("Source:          {}", self.source.display());
                println!("Destination:     {}", self.destination.display());
                println!("Files copied:    {}", self.files_copied());
                println!(
                    "Bytes copied:    {}",
                    humansize::format_size(self.bytes_copied(), humansize::BINARY)
                );
                println!("Buckets:         {}", self.buckets().len());
                println!("Duration:        {:.2?}", self.duration);

                let failures: Vec<_> = self.failures().collect();
                if !failures.is_empty() {
                    println!("\nFailures: {}", failures.len());
                    for outcome in failures {
                        if let ItemResult::Failed { error } = &outcome.result {
                            println!("  {} - {}", outcome.item.source_path().display(), error);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Sort engine for one run
pub struct SortEngine {
    config: SortConfig,
}

impl SortEngine {
    /// Create a new engine
    pub fn new(config: SortConfig) -> Self {
        Self { config }
    }

    /// Run the sort.
    ///
    /// Fails before touching the filesystem if the source is not a directory,
    /// and aborts if the traversal itself fails. Individual copy failures are
    /// reported in the returned [`SortReport`].
    pub async fn execute(&self) -> Result<SortReport> {
        let start_time = Instant::now();
        self.config.validate()?;

        let (source, destination) = self.resolve_paths()?;
        debug!(
            "Sorting {} into {} with up to {} concurrent copies",
            source.display(),
            destination.display(),
            self.config.concurrency
        );

        let walk_config = WalkConfig {
            follow_symlinks: self.config.follow_symlinks,
            exclude: nested_destination(&source, &destination),
        };
        let items = enumerate(source.clone(), walk_config).await?;
        debug!("Found {} files", items.len());

        let dispatcher = Dispatcher::new(
            DestinationLayout::new(&destination),
            CopyOptions {
                preserve: self.config.preserve,
            },
            self.config.concurrency,
        );

        let outcomes = dispatcher.dispatch(items.into_iter().map(Ok)).await?;

        Ok(SortReport {
            source,
            destination,
            outcomes,
            duration: start_time.elapsed(),
        })
    }

    /// Absolute source and destination; the source must be a directory
    fn resolve_paths(&self) -> Result<(PathBuf, PathBuf)> {
        let source = &self.config.source;
        if !source.is_dir() {
            return Err(SortCopyError::SourceNotDirectory(source.clone()));
        }

        let source = source.canonicalize().with_path(source)?;
        let destination =
            std::path::absolute(&self.config.destination).with_path(&self.config.destination)?;

        Ok((source, destination))
    }
}

/// Walk the whole tree on the blocking pool before any copy starts
async fn enumerate(root: PathBuf, config: WalkConfig) -> Result<Vec<WorkItem>> {
    let walk_root = root.clone();
    tokio::task::spawn_blocking(move || Walker::new(&walk_root, &config).collect())
        .await
        .map_err(|e| SortCopyError::TaskFailed {
            path: root,
            message: e.to_string(),
        })?
}

/// The destination, when it lies strictly inside the source
fn nested_destination(source: &Path, destination: &Path) -> Option<PathBuf> {
    let destination = destination
        .canonicalize()
        .unwrap_or_else(|_| destination.to_path_buf());
    (destination != source && destination.starts_with(source)).then_some(destination)
}

/// Sort `source` into `destination` with default settings
pub async fn sort_directory(source: &Path, destination: &Path) -> Result<SortReport> {
    let config = SortConfig {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        ..Default::default()
    };

    SortEngine::new(config).execute().await
}
