//! Directory walker and extension classifier
//!
//! Lazily walks a source tree and turns every regular file into a
//! [`WorkItem`] tagged with the bucket it will be copied into.

use crate::error::{Result, SortCopyError};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Bucket for files whose name carries no usable extension
pub const NO_EXTENSION: &str = "no_extension";

/// Derive the bucket name from a file name.
///
/// The bucket is everything after the last `.`, case preserved. Names
/// without a dot, or ending in a dot, land in [`NO_EXTENSION`]. A leading
/// dot counts like any other, so `.gitignore` goes to `gitignore`.
pub fn classify(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_string(),
        _ => NO_EXTENSION.to_string(),
    }
}

/// A single file scheduled for copying
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    source_path: PathBuf,
    bucket: String,
}

impl WorkItem {
    /// Build an item, classifying the file by its name
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        let source_path = source_path.into();
        let bucket = source_path
            .file_name()
            .map(|name| classify(&name.to_string_lossy()))
            .unwrap_or_else(|| NO_EXTENSION.to_string());

        Self {
            source_path,
            bucket,
        }
    }

    /// Path of the file to copy
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Bucket (destination subdirectory) this file belongs to
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// File name kept at the destination
    pub fn file_name(&self) -> Option<&OsStr> {
        self.source_path.file_name()
    }
}

/// Configuration for directory walking
#[derive(Debug, Clone, Default)]
pub struct WalkConfig {
    /// Descend into symlinked directories
    pub follow_symlinks: bool,
    /// Subtree to leave out, typically a destination nested in the source
    pub exclude: Option<PathBuf>,
}

/// Lazy, single-use iterator over the files below a root.
///
/// Regular files and symlinks to regular files are yielded.
/// A dangling link is yielded too, so its copy fails and gets reported.
///
/// Failing to read the root is yielded as [`SortCopyError::Enumeration`]
/// and ends the iteration. Errors deeper in the tree are logged and the
/// affected entry is skipped.
pub struct Walker {
    root: PathBuf,
    exclude: Option<PathBuf>,
    inner: walkdir::IntoIter,
    failed: bool,
}

impl Walker {
    /// Start a fresh traversal of `root`
    pub fn new(root: &Path, config: &WalkConfig) -> Self {
        let inner = WalkDir::new(root)
            .follow_links(config.follow_symlinks)
            .into_iter();

        Self {
            root: root.to_path_buf(),
            exclude: config.exclude.clone(),
            inner,
            failed: false,
        }
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        match &self.exclude {
            Some(exclude) => entry.depth() > 0 && entry.path() == exclude,
            None => false,
        }
    }
}

/// Whether an entry should become a work item
fn is_copy_candidate(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    if !file_type.is_symlink() {
        return false;
    }

    // Only reached when links are not followed
    match std::fs::metadata(entry.path()) {
        Ok(target) => target.is_file(),
        Err(_) => true,
    }
}

impl Iterator for Walker {
    type Item = Result<WorkItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        if self.is_excluded(&entry) {
                            self.inner.skip_current_dir();
                        }
                        continue;
                    }
                    if is_copy_candidate(&entry) {
                        return Some(Ok(WorkItem::new(entry.into_path())));
                    }
                }
                Err(err) if err.depth() > 0 => {
                    let path = err.path().unwrap_or(self.root.as_path()).to_path_buf();
                    warn!("Skipping {}: {}", path.display(), err);
                }
                Err(err) => {
                    self.failed = true;
                    return Some(Err(SortCopyError::enumeration(&self.root, err)));
                }
            }
        }
    }
}

impl std::iter::FusedIterator for Walker {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("a/x.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("a/b/y.txt"), b"y").unwrap();
        std::fs::write(dir.path().join("c.md"), b"c").unwrap();
        std::fs::write(dir.path().join("d"), b"d").unwrap();
        std::fs::write(dir.path().join(".hidden"), b"h").unwrap();

        dir
    }

    fn collect(root: &Path, config: &WalkConfig) -> BTreeSet<(String, String)> {
        Walker::new(root, config)
            .map(|item| {
                let item = item.unwrap();
                let name = item.file_name().unwrap().to_string_lossy().into_owned();
                (name, item.bucket().to_string())
            })
            .collect()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("report.PDF"), "PDF");
        assert_eq!(classify("archive.tar.gz"), "gz");
        assert_eq!(classify("README"), NO_EXTENSION);
        assert_eq!(classify(".gitignore"), "gitignore");
        assert_eq!(classify("notes."), NO_EXTENSION);
        assert_eq!(classify("."), NO_EXTENSION);
    }

    #[test]
    fn test_work_item_from_path() {
        let item = WorkItem::new("/data/photos/IMG_0001.JPG");
        assert_eq!(item.bucket(), "JPG");
        assert_eq!(item.file_name(), Some(OsStr::new("IMG_0001.JPG")));
        assert_eq!(item.source_path(), Path::new("/data/photos/IMG_0001.JPG"));

        // The directory name never affects the bucket
        let item = WorkItem::new("/data/v1.2/Makefile");
        assert_eq!(item.bucket(), NO_EXTENSION);
    }

    #[test]
    fn test_walker_finds_nested_files() {
        let dir = create_test_dir();
        let found = collect(dir.path(), &WalkConfig::default());

        let expected: BTreeSet<(String, String)> = [
            ("x.txt", "txt"),
            ("y.txt", "txt"),
            ("c.md", "md"),
            ("d", NO_EXTENSION),
            (".hidden", "hidden"),
        ]
        .into_iter()
        .map(|(n, b)| (n.to_string(), b.to_string()))
        .collect();

        assert_eq!(found, expected);
    }

    #[test]
    fn test_walker_yields_absolute_paths_under_root() {
        let dir = create_test_dir();
        let root = dir.path().canonicalize().unwrap();

        for item in Walker::new(&root, &WalkConfig::default()) {
            let item = item.unwrap();
            assert!(item.source_path().is_absolute());
            assert!(item.source_path().starts_with(&root));
            assert!(item.source_path().is_file());
        }
    }

    #[test]
    fn test_walker_empty_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();
        assert_eq!(Walker::new(dir.path(), &WalkConfig::default()).count(), 0);
    }

    #[test]
    fn test_walker_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");

        let mut walker = Walker::new(&missing, &WalkConfig::default());
        let err = walker.next().unwrap().unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(err.path(), Some(missing.as_path()));
        assert!(walker.next().is_none());
    }

    #[test]
    fn test_walker_skips_excluded_subtree() {
        let dir = create_test_dir();
        let sorted = dir.path().join("sorted");
        std::fs::create_dir_all(sorted.join("txt")).unwrap();
        std::fs::write(sorted.join("txt/x.txt"), b"x").unwrap();

        let config = WalkConfig {
            exclude: Some(sorted.clone()),
            ..Default::default()
        };
        let paths: Vec<PathBuf> = Walker::new(dir.path(), &config)
            .map(|item| item.unwrap().source_path().to_path_buf())
            .collect();

        assert_eq!(paths.len(), 5);
        assert!(paths.iter().all(|p| !p.starts_with(&sorted)));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_yielded() {
        let dir = create_test_dir();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("linked.rs"), b"fn main() {}").unwrap();
        std::fs::create_dir(outside.path().join("lib")).unwrap();
        std::fs::write(outside.path().join("lib/inner.c"), b"int x;").unwrap();

        let link = |target: &str, name: &str| {
            std::os::unix::fs::symlink(outside.path().join(target), dir.path().join(name))
                .unwrap()
        };
        link("linked.rs", "link.rs");
        link("gone.toml", "dangling.toml");
        link("lib", "lib");

        let plain = collect(dir.path(), &WalkConfig::default());
        assert!(plain.contains(&("link.rs".to_string(), "rs".to_string())));
        assert!(plain.contains(&("dangling.toml".to_string(), "toml".to_string())));
        assert!(!plain.iter().any(|(name, _)| name == "lib" || name == "inner.c"));

        let followed = collect(
            dir.path(),
            &WalkConfig {
                follow_symlinks: true,
                ..Default::default()
            },
        );
        assert!(followed.contains(&("link.rs".to_string(), "rs".to_string())));
        assert!(followed.contains(&("inner.c".to_string(), "c".to_string())));
        assert!(!followed.iter().any(|(name, _)| name == "dangling.toml"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = create_test_dir();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("secret.txt"), b"s").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        // Privileged users can still list it
        let denied = std::fs::read_dir(&locked).is_err();

        let items: Vec<_> = Walker::new(dir.path(), &WalkConfig::default()).collect();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert!(items.iter().all(Result::is_ok));
        let names: BTreeSet<String> = items
            .into_iter()
            .map(|item| item.unwrap().file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        for name in ["x.txt", "y.txt", "c.md", "d", ".hidden"] {
            assert!(names.contains(name), "missing {name}");
        }
        assert_eq!(names.contains("secret.txt"), !denied);
    }

    proptest! {
        #[test]
        fn prop_bucket_is_last_suffix(stem in "[a-zA-Z0-9_.]{0,12}", ext in "[a-zA-Z0-9_]{1,8}") {
            let name = format!("{}.{}", stem, ext);
            prop_assert_eq!(classify(&name), ext);
        }

        #[test]
        fn prop_dotless_names_use_sentinel(name in "[a-zA-Z0-9_ -]{1,16}") {
            prop_assert_eq!(classify(&name), NO_EXTENSION);
        }
    }
}
