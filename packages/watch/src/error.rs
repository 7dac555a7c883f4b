//! Error types for the watch scheduler.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

/// Errors that can occur while starting or running the watch scheduler.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The platform file watcher could not be created.
    #[error("Failed to create file watcher: {source}")]
    WatcherError {
        /// The underlying notify error.
        #[source]
        source: notify::Error,
    },

    /// A root could not be registered with the file watcher.
    #[error("Failed to watch {}: {source}", path.display())]
    WatchRootError {
        /// The root that was refused.
        path: PathBuf,
        /// The underlying notify error.
        #[source]
        source: notify::Error,
    },

    /// Every planned watch root was skipped.
    #[error("Nothing to watch under {}", project_root.display())]
    NoWatchRoots {
        /// The project root.
        project_root: PathBuf,
    },

    /// A worker thread could not be spawned.
    #[error("Failed to spawn {name} thread: {source}")]
    SpawnError {
        /// Thread name.
        name: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
