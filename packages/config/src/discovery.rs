//! Project root and configuration file discovery.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use crate::types::Settings;

/// Settings file name at the project root.
pub const SETTINGS_FILE: &str = "smartdeploy.toml";

/// Default mapping file location, relative to the project root.
pub const DEFAULT_MAPPING_FILE: &str = ".smartdeploy/mappings.json";

const ROOT_MARKERS: [&str; 5] = [
    SETTINGS_FILE,
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    ".classpath",
];

/// Canonical form of `path`, the form file watchers report events in.
///
/// Symlinks and `..` segments are resolved. A path that does not exist yet
/// keeps its existing ancestor canonicalized and the rest appended.
#[must_use]
pub fn canonical_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = dunce::canonicalize(path) {
        return canonical;
    }

    let cleaned = path_clean::clean(path);
    for ancestor in cleaned.ancestors().skip(1) {
        if let Ok(canonical) = dunce::canonicalize(ancestor) {
            let rest = cleaned.strip_prefix(ancestor).unwrap_or(&cleaned);
            return canonical.join(rest);
        }
    }
    cleaned
}

/// Find the project root containing `start`.
///
/// Walks up from `start` to the first directory holding a settings file or a
/// build descriptor. Returns `start` itself when no ancestor qualifies.
#[must_use]
pub fn find_project_root(start: &Path) -> PathBuf {
    log::debug!("Looking for a project root above {}", start.display());

    start
        .ancestors()
        .find(|dir| ROOT_MARKERS.iter().any(|marker| dir.join(marker).is_file()))
        .map_or_else(|| start.to_path_buf(), Path::to_path_buf)
}

/// Absolute path of the settings file for `project_root`.
#[must_use]
pub fn settings_path(project_root: &Path) -> PathBuf {
    project_root.join(SETTINGS_FILE)
}

/// Absolute path of the mapping file for `project_root`.
#[must_use]
pub fn mapping_file_path(project_root: &Path, settings: &Settings) -> PathBuf {
    let relative = settings
        .mapping_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MAPPING_FILE));
    project_root.join(relative)
}
