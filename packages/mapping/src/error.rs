//! Error types for destination resolution.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

/// Errors that can occur while resolving a destination.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Failed to create the destination's parent directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateParent {
        /// The directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
