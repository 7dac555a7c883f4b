//! Error types for copy operations.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

/// Errors that can occur during copy operations.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// Failed to create target directory.
    #[error("Failed to create directory {}: {io_error}", path.display())]
    CreateDirError {
        /// The directory path.
        path: PathBuf,
        /// The underlying IO error.
        io_error: std::io::Error,
    },

    /// Failed to copy a file.
    #[error("Failed to copy {} to {}: {io_error}", source_path.display(), target_path.display())]
    FileCopyError {
        /// Source file path.
        source_path: PathBuf,
        /// Target file path.
        target_path: PathBuf,
        /// The underlying IO error.
        io_error: std::io::Error,
    },

    /// Failed to remove a stale file or directory.
    #[error("Failed to remove {}: {io_error}", path.display())]
    RemoveError {
        /// The path that could not be removed.
        path: PathBuf,
        /// The underlying IO error.
        io_error: std::io::Error,
    },

    /// Directory enumeration failed.
    #[error("Failed to enumerate directory {}: {message}", path.display())]
    EnumerationError {
        /// The directory path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to open or read an archive.
    #[error("Failed to read archive {}: {source}", path.display())]
    ArchiveError {
        /// The archive path.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// An archive entry would be written outside the target directory.
    #[error("Archive {} contains an unsafe entry: {entry}", path.display())]
    UnsafeArchiveEntry {
        /// The archive path.
        path: PathBuf,
        /// The entry name as stored in the archive.
        entry: String,
    },
}

impl CopyError {
    /// The IO error behind this failure, if any.
    #[must_use]
    pub const fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            Self::CreateDirError { io_error, .. }
            | Self::FileCopyError { io_error, .. }
            | Self::RemoveError { io_error, .. } => Some(io_error),
            Self::EnumerationError { .. }
            | Self::ArchiveError { .. }
            | Self::UnsafeArchiveEntry { .. } => None,
        }
    }
}
