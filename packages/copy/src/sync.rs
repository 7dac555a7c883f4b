//! Reconciling directory sync.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::copy::{FileEntry, copy_entries, enumerate_directory};
use crate::error::CopyError;
use crate::progress::CopyProgress;

/// Result of a reconciling sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Files copied because they were new or changed.
    pub files_copied: u64,
    /// Files left alone because the target was already current.
    pub files_unchanged: u64,
    /// Stale files and directories removed from the target.
    pub entries_removed: u64,
}

/// Make `target` mirror `source`.
///
/// New and changed files are copied. Target entries without a source
/// counterpart are deleted, except anything under one of the `protected`
/// target-relative directories (e.g. `WEB-INF/classes`).
///
/// # Arguments
///
/// * `source` - Source directory path
/// * `target` - Target directory path (created if missing)
/// * `protected` - Target-relative directories that are never pruned
/// * `on_progress` - Callback for copy progress
///
/// # Errors
///
/// * If enumeration fails
/// * If a copy or removal fails
pub fn sync_directory<F>(
    source: &Path,
    target: &Path,
    protected: &[PathBuf],
    on_progress: F,
) -> Result<SyncResult, CopyError>
where
    F: Fn(&CopyProgress) + Sync,
{
    log::debug!(
        "Syncing directory: {} -> {}",
        source.display(),
        target.display()
    );

    let entries = if source.is_dir() {
        enumerate_directory(source, target)?
    } else {
        log::debug!("Source does not exist, target will only be pruned");
        Vec::new()
    };

    let wanted: HashSet<PathBuf> = entries.iter().map(|e| e.target.clone()).collect();
    let (changed, unchanged): (Vec<FileEntry>, Vec<FileEntry>) =
        entries.into_iter().partition(is_stale);

    let files_copied = copy_entries(&changed, target, &on_progress)?;
    let entries_removed = prune(source, target, &wanted, protected)?;

    Ok(SyncResult {
        files_copied,
        files_unchanged: unchanged.len() as u64,
        entries_removed,
    })
}

/// Whether the target copy is missing or older/different than the source.
fn is_stale(entry: &FileEntry) -> bool {
    let (Ok(source), Ok(target)) = (fs::metadata(&entry.source), fs::metadata(&entry.target))
    else {
        return true;
    };
    if source.len() != target.len() {
        return true;
    }
    match (source.modified(), target.modified()) {
        (Ok(s), Ok(t)) => s > t,
        _ => true,
    }
}

fn prune(
    source: &Path,
    target: &Path,
    wanted: &HashSet<PathBuf>,
    protected: &[PathBuf],
) -> Result<u64, CopyError> {
    let protected: Vec<PathBuf> = protected.iter().map(|p| target.join(p)).collect();
    let is_protected = |path: &Path| protected.iter().any(|p| path.starts_with(p));

    let mut stale_files = Vec::new();
    let mut directories = Vec::new();

    for entry in jwalk::WalkDir::new(target)
        .skip_hidden(false)
        .follow_links(false)
    {
        let entry = entry.map_err(|e| CopyError::EnumerationError {
            path: target.to_path_buf(),
            message: e.to_string(),
        })?;
        let path = entry.path();
        if path == target || is_protected(&path) {
            continue;
        }
        if entry.file_type().is_dir() {
            directories.push(path);
        } else if !wanted.contains(&path) {
            stale_files.push(path);
        }
    }

    let mut removed = 0;
    for path in stale_files {
        log::debug!("Removing stale {}", path.display());
        fs::remove_file(&path).map_err(|e| CopyError::RemoveError {
            path: path.clone(),
            io_error: e,
        })?;
        removed += 1;
    }

    // Deepest first so parents are empty by the time they are checked.
    directories.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for dir in directories {
        let counterpart = dir
            .strip_prefix(target)
            .map(|rel| source.join(rel))
            .unwrap_or_default();
        let holds_protected = protected.iter().any(|p| p.starts_with(&dir));
        if counterpart.is_dir() || holds_protected {
            continue;
        }
        let is_empty = fs::read_dir(&dir).map(|mut d| d.next().is_none()).unwrap_or(false);
        if is_empty {
            fs::remove_dir(&dir).map_err(|e| CopyError::RemoveError {
                path: dir.clone(),
                io_error: e,
            })?;
            removed += 1;
        }
    }

    Ok(removed)
}

/// Remove everything inside `target`, keeping (or creating) the directory.
///
/// # Errors
///
/// * If the directory cannot be created or an entry cannot be removed
pub fn clear_directory(target: &Path) -> Result<u64, CopyError> {
    log::debug!("Clearing directory {}", target.display());

    fs::create_dir_all(target).map_err(|e| CopyError::CreateDirError {
        path: target.to_path_buf(),
        io_error: e,
    })?;

    let entries = fs::read_dir(target).map_err(|e| CopyError::EnumerationError {
        path: target.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut removed = 0;
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let result = if entry.file_type().is_ok_and(|t| t.is_dir()) {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| CopyError::RemoveError {
            path: path.clone(),
            io_error: e,
        })?;
        removed += 1;
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sync_prunes_stale_entries_but_keeps_protected() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("web");
        let target = dir.path().join("deploy");

        fs::create_dir_all(source.join("css")).unwrap();
        fs::write(source.join("index.jsp"), "index").unwrap();
        fs::write(source.join("css/site.css"), "css").unwrap();

        fs::create_dir_all(target.join("old/deeper")).unwrap();
        fs::create_dir_all(target.join("WEB-INF/classes/com")).unwrap();
        fs::create_dir_all(target.join("WEB-INF/lib")).unwrap();
        fs::write(target.join("removed.jsp"), "gone").unwrap();
        fs::write(target.join("old/deeper/a.txt"), "gone").unwrap();
        fs::write(target.join("WEB-INF/classes/com/Foo.class"), "class").unwrap();
        fs::write(target.join("WEB-INF/lib/a.jar"), "jar").unwrap();

        let result = sync_directory(
            &source,
            &target,
            &[PathBuf::from("WEB-INF/classes"), PathBuf::from("WEB-INF/lib")],
            |_| {},
        )
        .unwrap();

        assert_eq!(result.files_copied, 2);
        assert!(target.join("index.jsp").is_file());
        assert!(target.join("css/site.css").is_file());
        assert!(!target.join("removed.jsp").exists());
        assert!(!target.join("old").exists());
        assert!(target.join("WEB-INF/classes/com/Foo.class").is_file());
        assert!(target.join("WEB-INF/lib/a.jar").is_file());
    }

    #[test]
    fn test_sync_skips_unchanged_files() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("web");
        let target = dir.path().join("deploy");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.txt"), "a").unwrap();

        sync_directory(&source, &target, &[], |_| {}).unwrap();
        let second = sync_directory(&source, &target, &[], |_| {}).unwrap();

        assert_eq!(second.files_copied, 0);
        assert_eq!(second.files_unchanged, 1);
        assert_eq!(second.entries_removed, 0);
    }

    #[test]
    fn test_clear_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("deploy");
        fs::create_dir_all(target.join("a/b")).unwrap();
        fs::write(target.join("a/b/c.txt"), "c").unwrap();
        fs::write(target.join("d.txt"), "d").unwrap();

        let removed = clear_directory(&target).unwrap();

        assert_eq!(removed, 2);
        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }
}
