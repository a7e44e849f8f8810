//! Bucket copy operations
//!
//! Blocking per-item work: make sure the bucket directory exists, copy the
//! bytes, then carry timestamps over on a best-effort basis.

use crate::error::{IoResultExt, Result, SortCopyError};
use crate::fs::WorkItem;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where buckets live under the destination root
#[derive(Debug, Clone)]
pub struct DestinationLayout {
    root: PathBuf,
}

impl DestinationLayout {
    /// Layout rooted at `root` (expected to be absolute)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory that holds every file of `bucket`
    pub fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    /// Final path of `item`, or `None` if its source has no file name
    pub fn destination_for(&self, item: &WorkItem) -> Option<PathBuf> {
        item.file_name()
            .map(|name| self.bucket_dir(item.bucket()).join(name))
    }
}

/// Options for bucket copies
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Copy modification and access times
    pub preserve: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self { preserve: true }
    }
}

/// A completed copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    /// Where the file landed
    pub destination: PathBuf,
    /// Bytes written
    pub bytes_copied: u64,
}

/// Create the bucket directory and any missing parents.
///
/// Safe to race: a sibling creating the same directory first is not an error.
pub fn ensure_bucket(layout: &DestinationLayout, bucket: &str) -> Result<PathBuf> {
    let dir = layout.bucket_dir(bucket);
    std::fs::create_dir_all(&dir).with_path(&dir)?;
    Ok(dir)
}

/// Copy one work item into its bucket, overwriting any existing file
pub fn copy_into_bucket(
    item: &WorkItem,
    layout: &DestinationLayout,
    options: &CopyOptions,
) -> Result<CopiedFile> {
    let destination = layout.destination_for(item).ok_or_else(|| {
        SortCopyError::io(
            item.source_path(),
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;

    ensure_bucket(layout, item.bucket())?;

    // Copying a file onto itself would truncate it
    if is_same_file(item.source_path(), &destination) {
        return Err(SortCopyError::io(
            item.source_path(),
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' is the same file", destination.display()),
            ),
        ));
    }

    // std::fs::copy carries the permission bits along with the content
    let bytes_copied = std::fs::copy(item.source_path(), &destination)
        .with_path(item.source_path())?;

    if options.preserve {
        preserve_times(item.source_path(), &destination);
    }

    Ok(CopiedFile {
        destination,
        bytes_copied,
    })
}

#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Copy mtime and atime; failures are logged, never returned
fn preserve_times(source: &Path, dest: &Path) {
    let metadata = match std::fs::metadata(source) {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!("Could not read timestamps of {}: {}", source.display(), e);
            return;
        }
    };

    let mtime = filetime::FileTime::from_last_modification_time(&metadata);
    let atime = filetime::FileTime::from_last_access_time(&metadata);

    if let Err(e) = filetime::set_file_times(dest, atime, mtime) {
        debug!("Could not set timestamps on {}: {}", dest.display(), e);
    }
}
