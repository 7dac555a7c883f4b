//! Overlay copying.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::CopyError;
use crate::progress::{CopyPhase, CopyProgress, ProgressTracker};

/// Result of a copy operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyResult {
    /// Files were copied.
    Created {
        /// Number of files copied.
        files_copied: u64,
    },
    /// Source does not exist, operation skipped.
    SourceNotFound,
}

/// Entry collected during directory enumeration.
#[derive(Debug, Clone)]
pub(crate) struct FileEntry {
    /// Source path.
    pub source: PathBuf,
    /// Target path.
    pub target: PathBuf,
}

/// Copy a single file, overwriting the target.
///
/// A source that vanished before the copy is a skipped no-op.
///
/// # Arguments
///
/// * `source` - Source file path
/// * `target` - Target file path
///
/// # Errors
///
/// * If the parent directory cannot be created
/// * If the copy operation fails
pub fn overwrite_file(source: &Path, target: &Path) -> Result<CopyResult, CopyError> {
    log::debug!(
        "Overwriting file: {} -> {}",
        source.display(),
        target.display()
    );

    if !source.is_file() {
        log::debug!("Source does not exist");
        return Ok(CopyResult::SourceNotFound);
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| CopyError::CreateDirError {
            path: parent.to_path_buf(),
            io_error: e,
        })?;
    }

    copy_file_with_reflink(source, target)?;

    Ok(CopyResult::Created { files_copied: 1 })
}

/// Copy every file under `source` into `target`, overwriting existing files.
///
/// Files already in `target` without a source counterpart are left alone.
///
/// # Arguments
///
/// * `source` - Source directory path
/// * `target` - Target directory path (created if missing)
/// * `on_progress` - Callback for progress updates (called periodically, not for every file)
///
/// # Errors
///
/// * If enumeration fails
/// * If any file copy fails (fail-fast behavior)
pub fn copy_directory<F>(
    source: &Path,
    target: &Path,
    on_progress: F,
) -> Result<CopyResult, CopyError>
where
    F: Fn(&CopyProgress) + Sync,
{
    log::debug!(
        "Copying directory: {} -> {}",
        source.display(),
        target.display()
    );

    if !source.is_dir() {
        log::debug!("Source does not exist");
        return Ok(CopyResult::SourceNotFound);
    }

    let entries = enumerate_directory(source, target)?;
    let copied = copy_entries(&entries, target, &on_progress)?;

    Ok(CopyResult::Created {
        files_copied: copied,
    })
}

/// Copy `entries` in parallel, creating parent directories first.
pub(crate) fn copy_entries<F>(
    entries: &[FileEntry],
    target: &Path,
    on_progress: &F,
) -> Result<u64, CopyError>
where
    F: Fn(&CopyProgress) + Sync,
{
    let total_files = entries.len() as u64;
    log::debug!("Found {total_files} files to copy");

    let mut dirs: BTreeSet<PathBuf> = BTreeSet::new();
    dirs.insert(target.to_path_buf());
    for entry in entries {
        if let Some(parent) = entry.target.parent() {
            dirs.insert(parent.to_path_buf());
        }
    }

    for dir in &dirs {
        fs::create_dir_all(dir).map_err(|e| CopyError::CreateDirError {
            path: dir.clone(),
            io_error: e,
        })?;
    }

    if total_files == 0 {
        return Ok(0);
    }

    let tracker = ProgressTracker::new(CopyPhase::Copying);
    tracker.set_total(total_files);
    on_progress(&tracker.snapshot(None));

    let tracker_ref = &tracker;

    entries
        .par_iter()
        .try_for_each(|entry| -> Result<(), CopyError> {
            copy_file_with_reflink(&entry.source, &entry.target)?;

            let copied = tracker_ref.increment();
            if copied % 100 == 0 || copied == total_files {
                on_progress(
                    &tracker_ref.snapshot(Some(entry.source.to_string_lossy().to_string())),
                );
            }

            Ok(())
        })?;

    on_progress(&tracker.snapshot(None));

    Ok(total_files)
}

/// Enumerate all regular files under `source` using jwalk.
pub(crate) fn enumerate_directory(
    source: &Path,
    target: &Path,
) -> Result<Vec<FileEntry>, CopyError> {
    let mut entries = Vec::new();

    for entry in jwalk::WalkDir::new(source)
        .skip_hidden(false)
        .follow_links(true)
    {
        let entry = entry.map_err(|e| CopyError::EnumerationError {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let source_path = entry.path();
        let rel_path =
            source_path
                .strip_prefix(source)
                .map_err(|_| CopyError::EnumerationError {
                    path: source_path.clone(),
                    message: "Failed to strip prefix".to_string(),
                })?;

        entries.push(FileEntry {
            target: target.join(rel_path),
            source: source_path.clone(),
        });
    }

    Ok(entries)
}

/// Copy a single file, trying reflink first then falling back to regular copy.
fn copy_file_with_reflink(source: &Path, target: &Path) -> Result<(), CopyError> {
    // reflink refuses to replace an existing file
    if target.is_file() {
        fs::remove_file(target).map_err(|e| CopyError::FileCopyError {
            source_path: source.to_path_buf(),
            target_path: target.to_path_buf(),
            io_error: e,
        })?;
    }

    match reflink_copy::reflink(source, target) {
        Ok(()) => {
            log::trace!("Reflinked {} -> {}", source.display(), target.display());
            Ok(())
        }
        Err(_) => {
            fs::copy(source, target).map_err(|e| CopyError::FileCopyError {
                source_path: source.to_path_buf(),
                target_path: target.to_path_buf(),
                io_error: e,
            })?;
            log::trace!("Copied {} -> {}", source.display(), target.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tempfile::TempDir;

    #[test]
    fn test_overwrite_file_replaces_content() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("nested/target.txt");

        fs::write(&source, "new content").unwrap();
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "old content").unwrap();

        let result = overwrite_file(&source, &target).unwrap();

        assert_eq!(result, CopyResult::Created { files_copied: 1 });
        assert_eq!(fs::read_to_string(&target).unwrap(), "new content");
    }

    #[test]
    fn test_overwrite_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.txt");
        let target = dir.path().join("a/b/c/target.txt");
        fs::write(&source, "hello").unwrap();

        overwrite_file(&source, &target).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "hello");
    }

    #[test]
    fn test_overwrite_file_source_not_found() {
        let dir = TempDir::new().unwrap();

        let result =
            overwrite_file(&dir.path().join("missing.txt"), &dir.path().join("t.txt")).unwrap();

        assert_eq!(result, CopyResult::SourceNotFound);
        assert!(!dir.path().join("t.txt").exists());
    }

    #[test]
    fn test_copy_directory_overlays_existing_target() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source_dir");
        let target = dir.path().join("target_dir");

        fs::create_dir_all(source.join("subdir")).unwrap();
        fs::write(source.join("file1.txt"), "content1").unwrap();
        fs::write(source.join("subdir/file2.txt"), "content2").unwrap();
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("file1.txt"), "stale").unwrap();
        fs::write(target.join("extra.txt"), "kept").unwrap();

        let progress_updates = Arc::new(AtomicU64::new(0));
        let progress_updates_clone = Arc::clone(&progress_updates);

        let result = copy_directory(&source, &target, move |_| {
            progress_updates_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        assert_eq!(result, CopyResult::Created { files_copied: 2 });
        assert_eq!(
            fs::read_to_string(target.join("file1.txt")).unwrap(),
            "content1"
        );
        assert_eq!(
            fs::read_to_string(target.join("subdir/file2.txt")).unwrap(),
            "content2"
        );
        assert_eq!(fs::read_to_string(target.join("extra.txt")).unwrap(), "kept");
        assert!(progress_updates.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_copy_directory_source_not_found() {
        let dir = TempDir::new().unwrap();

        let result =
            copy_directory(&dir.path().join("missing"), &dir.path().join("t"), |_| {}).unwrap();

        assert_eq!(result, CopyResult::SourceNotFound);
    }
}
