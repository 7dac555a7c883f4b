//! Web archive extraction.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs::{self, File};
use std::io;
use std::path::Path;

use zip::ZipArchive;

use crate::error::CopyError;
use crate::progress::{CopyPhase, CopyProgress, ProgressTracker};

/// Unpack the zip-format `archive` into `target`.
///
/// Entries whose names would resolve outside `target` (absolute paths or
/// `..` segments) abort the extraction.
///
/// # Arguments
///
/// * `archive` - Path to a `.war`/`.zip` file
/// * `target` - Directory to unpack into (created if missing)
/// * `on_progress` - Callback for progress updates
///
/// # Errors
///
/// * If the archive cannot be opened or read
/// * If an entry is unsafe
/// * If a file cannot be written
pub fn extract_archive<F>(archive: &Path, target: &Path, on_progress: F) -> Result<u64, CopyError>
where
    F: Fn(&CopyProgress),
{
    log::debug!(
        "Extracting {} into {}",
        archive.display(),
        target.display()
    );

    let archive_error = |source: zip::result::ZipError| CopyError::ArchiveError {
        path: archive.to_path_buf(),
        source,
    };

    let file = File::open(archive).map_err(|e| archive_error(zip::result::ZipError::Io(e)))?;
    let mut zip = ZipArchive::new(file).map_err(archive_error)?;

    fs::create_dir_all(target).map_err(|e| CopyError::CreateDirError {
        path: target.to_path_buf(),
        io_error: e,
    })?;

    let tracker = ProgressTracker::new(CopyPhase::Extracting);
    tracker.set_total(zip.len() as u64);
    on_progress(&tracker.snapshot(None));

    let mut extracted = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(archive_error)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(CopyError::UnsafeArchiveEntry {
                path: archive.to_path_buf(),
                entry: entry.name().to_string(),
            });
        };
        let out_path = target.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| CopyError::CreateDirError {
                path: out_path.clone(),
                io_error: e,
            })?;
            tracker.increment();
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| CopyError::CreateDirError {
                path: parent.to_path_buf(),
                io_error: e,
            })?;
        }

        let copy_error = |e: io::Error| CopyError::FileCopyError {
            source_path: archive.to_path_buf(),
            target_path: out_path.clone(),
            io_error: e,
        };
        let mut out = File::create(&out_path).map_err(copy_error)?;
        io::copy(&mut entry, &mut out).map_err(copy_error)?;
        extracted += 1;

        if tracker.increment() % 100 == 0 {
            on_progress(&tracker.snapshot(Some(entry.name().to_string())));
        }
    }

    on_progress(&tracker.snapshot(None));

    log::debug!("Extracted {extracted} files");
    Ok(extracted)
}
