//! Concurrent copy dispatcher
//!
//! Every work item becomes its own blocking task on tokio's blocking pool.
//! A semaphore bounds how many run at once. A failing item is logged and
//! recorded, never propagated; only a failure of the item stream itself
//! (traversal) stops the dispatch, and even then every copy already spawned
//! runs to completion and is logged.

use crate::error::{Result, SortCopyError};
use crate::fs::{copy_into_bucket, CopiedFile, CopyOptions, DestinationLayout, WorkItem};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info};

/// How a single item ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemResult {
    /// The file was copied
    Copied {
        /// Final path of the copy
        destination: PathBuf,
        /// Bytes written
        bytes: u64,
    },
    /// The copy failed; the run carried on
    Failed {
        /// Error detail
        error: String,
    },
}

/// Terminal state of one dispatched item
#[derive(Debug, Clone, Serialize)]
pub struct CopyOutcome {
    /// The item that was dispatched
    pub item: WorkItem,
    /// Its result
    #[serde(flatten)]
    pub result: ItemResult,
}

impl CopyOutcome {
    /// Whether the copy succeeded
    pub fn is_copied(&self) -> bool {
        matches!(self.result, ItemResult::Copied { .. })
    }

    /// Log this outcome and return it
    fn logged(self) -> Self {
        match &self.result {
            ItemResult::Copied { destination, .. } => {
                info!(
                    "Copied {} -> {}",
                    self.item.source_path().display(),
                    destination.display()
                );
            }
            ItemResult::Failed { error } => {
                error!(
                    "Failed to copy {}: {}",
                    self.item.source_path().display(),
                    error
                );
            }
        }
        self
    }
}

/// Fans work items out to blocking copy tasks
pub struct Dispatcher {
    layout: Arc<DestinationLayout>,
    options: Arc<CopyOptions>,
    semaphore: Arc<Semaphore>,
}

impl Dispatcher {
    /// Create a dispatcher allowing at most `concurrency` copies in flight
    pub fn new(layout: DestinationLayout, options: CopyOptions, concurrency: usize) -> Self {
        Self {
            layout: Arc::new(layout),
            options: Arc::new(options),
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Dispatch every item and wait until all of them are settled.
    ///
    /// Returns one outcome per item. If `items` yields an error, no further
    /// items are pulled, the copies already spawned are awaited, and the
    /// error is returned.
    pub async fn dispatch<I>(&self, items: I) -> Result<Vec<CopyOutcome>>
    where
        I: IntoIterator<Item = Result<WorkItem>>,
    {
        let mut tasks: JoinSet<CopyOutcome> = JoinSet::new();
        let mut outcomes = Vec::new();

        for item in items {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    debug!("Item stream failed with {} copies in flight", tasks.len());
                    settle_all(&mut tasks, &mut outcomes).await;
                    return Err(e);
                }
            };

            let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    settle_all(&mut tasks, &mut outcomes).await;
                    return Err(SortCopyError::TaskFailed {
                        path: item.source_path().to_path_buf(),
                        message: e.to_string(),
                    });
                }
            };

            let layout = Arc::clone(&self.layout);
            let options = Arc::clone(&self.options);

            tasks.spawn_blocking(move || {
                let _permit = permit;
                run_copy(item, &layout, &options)
            });

            while let Some(joined) = tasks.try_join_next() {
                if let Some(outcome) = settle(joined) {
                    outcomes.push(outcome);
                }
            }
        }

        settle_all(&mut tasks, &mut outcomes).await;

        debug!("Dispatched {} items", outcomes.len());
        Ok(outcomes)
    }
}

/// Wait for every spawned copy and record its outcome
async fn settle_all(tasks: &mut JoinSet<CopyOutcome>, outcomes: &mut Vec<CopyOutcome>) {
    while let Some(joined) = tasks.join_next().await {
        if let Some(outcome) = settle(joined) {
            outcomes.push(outcome);
        }
    }
}

/// Body of a blocking copy task; a panic becomes a failed outcome
fn run_copy(item: WorkItem, layout: &DestinationLayout, options: &CopyOptions) -> CopyOutcome {
    let attempt = std::panic::catch_unwind(AssertUnwindSafe(|| {
        copy_into_bucket(&item, layout, options)
    }));

    let result = match attempt {
        Ok(Ok(CopiedFile {
            destination,
            bytes_copied,
        })) => ItemResult::Copied {
            destination,
            bytes: bytes_copied,
        },
        Ok(Err(e)) => ItemResult::Failed {
            error: e.to_string(),
        },
        Err(panic) => ItemResult::Failed {
            error: SortCopyError::TaskFailed {
                path: item.source_path().to_path_buf(),
                message: panic_message(panic.as_ref()),
            }
            .to_string(),
        },
    };

    CopyOutcome { item, result }
}

fn settle(joined: std::result::Result<CopyOutcome, JoinError>) -> Option<CopyOutcome> {
    match joined {
        Ok(outcome) => Some(outcome.logged()),
        Err(e) => {
            // Only reachable if the runtime shuts down under us
            error!("Copy task did not complete: {}", e);
            None
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
