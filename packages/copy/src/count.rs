//! Deployed file counting.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::Path;

/// Count regular files under `path`.
///
/// A file counts as 1; a missing path or a symlink counts as 0. Used to
/// confirm that a target directory actually received an artifact.
#[must_use]
pub fn count_files(path: &Path) -> u64 {
    if !path.exists() || path.is_symlink() {
        return 0;
    }

    if path.is_file() {
        return 1;
    }

    jwalk::WalkDir::new(path)
        .skip_hidden(false)
        .sort(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .count() as u64
}
