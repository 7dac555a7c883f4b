//! Channel routing for incoming events.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Component, Path};

use smartdeploy_mapping::is_transient;

use crate::snapshot::WatchSnapshot;

/// Compiled-output extension.
pub const COMPILED_EXTENSION: &str = "class";

/// Source extension whose edits trigger a rescan of the output root.
pub const SOURCE_EXTENSION: &str = "java";

/// Why an event was dropped before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The file name matches a bypass pattern.
    Bypassed,
    /// Editor scratch or backup file.
    Transient,
    /// The path passes through a hidden directory.
    Hidden,
    /// The path is outside the project root.
    OutsideProject,
    /// The path is inside the deployed webapp.
    DeployTarget,
}

/// Where an event goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Deployed immediately.
    Static,
    /// Collected into the pending batch.
    Compiled,
    /// Source edit; the output root is rescanned.
    SourceEdit,
    /// A configuration file changed.
    ConfigChanged,
    /// Dropped.
    Ignored(IgnoreReason),
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Decide which channel handles `path`.
#[must_use]
pub fn route(snapshot: &WatchSnapshot, path: &Path) -> Route {
    if snapshot.is_config_file(path) {
        return Route::ConfigChanged;
    }
    // Deployed copies would otherwise be redeployed into themselves.
    if path.starts_with(&snapshot.webapp_root) {
        return Route::Ignored(IgnoreReason::DeployTarget);
    }

    let Ok(relative) = path.strip_prefix(&snapshot.project_root) else {
        return Route::Ignored(IgnoreReason::OutsideProject);
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if snapshot.bypass.is_bypassed(&file_name) {
        return Route::Ignored(IgnoreReason::Bypassed);
    }
    if is_transient(&file_name) {
        return Route::Ignored(IgnoreReason::Transient);
    }

    let hidden = relative.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    });
    if hidden {
        return Route::Ignored(IgnoreReason::Hidden);
    }

    if has_extension(path, COMPILED_EXTENSION) && path.starts_with(&snapshot.output_root) {
        return Route::Compiled;
    }
    if has_extension(path, SOURCE_EXTENSION) {
        return Route::SourceEdit;
    }
    Route::Static
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::snapshot;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_route_by_extension_and_root() {
        let dir = TempDir::new().unwrap();
        let snapshot = snapshot(dir.path());
        let root = dir.path();

        assert_eq!(
            route(&snapshot, &root.join("target/classes/com/Foo.class")),
            Route::Compiled
        );
        assert_eq!(
            route(&snapshot, &root.join("src/main/java/com/Foo.java")),
            Route::SourceEdit
        );
        assert_eq!(
            route(&snapshot, &root.join("src/main/webapp/index.jsp")),
            Route::Static
        );
        // Outside the output root a class file is just a static file.
        assert_eq!(route(&snapshot, &root.join("lib/Foo.class")), Route::Static);
    }

    #[test]
    fn test_route_rejects_before_matching() {
        let dir = TempDir::new().unwrap();
        let snapshot = snapshot(dir.path());
        let root = dir.path();

        assert_eq!(
            route(&snapshot, &root.join("src/main/webapp/index - Copy.jsp")),
            Route::Ignored(IgnoreReason::Bypassed)
        );
        assert_eq!(
            route(&snapshot, &root.join("src/main/webapp/index.jsp~")),
            Route::Ignored(IgnoreReason::Transient)
        );
        assert_eq!(
            route(&snapshot, &root.join(".git/index")),
            Route::Ignored(IgnoreReason::Hidden)
        );
        assert_eq!(
            route(&snapshot, Path::new("/elsewhere/a.jsp")),
            Route::Ignored(IgnoreReason::OutsideProject)
        );
    }

    #[test]
    fn test_route_through_non_canonical_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("other")).unwrap();
        fs::create_dir_all(dir.path().join("proj")).unwrap();
        let snapshot = snapshot(&dir.path().join("other/../proj"));
        let root = fs::canonicalize(dir.path().join("proj")).unwrap();

        assert_eq!(
            route(&snapshot, &root.join("src/main/webapp/index.jsp")),
            Route::Static
        );
        assert_eq!(
            route(&snapshot, &root.join("target/classes/com/example/Foo.class")),
            Route::Compiled
        );
    }

    #[test]
    fn test_route_ignores_deployed_copies() {
        let dir = TempDir::new().unwrap();
        let snapshot = snapshot(dir.path());
        let root = &snapshot.project_root;

        assert_eq!(
            route(&snapshot, &root.join("deploy/WEB-INF/classes/conf/a.properties")),
            Route::Ignored(IgnoreReason::DeployTarget)
        );
        assert_eq!(
            route(&snapshot, &root.join("deploy/index.jsp")),
            Route::Ignored(IgnoreReason::DeployTarget)
        );
        assert_eq!(
            route(&snapshot, &root.join("deployment/notes.txt")),
            Route::Static
        );
    }

    #[test]
    fn test_route_config_files_first() {
        let dir = TempDir::new().unwrap();
        let snapshot = snapshot(dir.path());

        assert_eq!(
            route(&snapshot, &dir.path().join(".smartdeploy/mappings.json")),
            Route::ConfigChanged
        );
    }
}
