//! Error types for the build pipeline.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use smartdeploy_copy::CopyError;
use smartdeploy_mapping::ResolveError;

/// Errors that can occur while building and deploying.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// No deploy target is configured.
    #[error("No deploy target: set deployDir or serverHome in smartdeploy.toml")]
    NoDeployTarget,

    /// A required executable could not be found.
    #[error("Could not find {tool} (looked for a project wrapper, JAVA_HOME and PATH)")]
    ToolNotFound {
        /// Executable name.
        tool: String,
    },

    /// An external command could not be started.
    #[error("Failed to run {command}: {source}")]
    SpawnError {
        /// The command line.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// An external command ran past its timeout and was killed.
    #[error("{command} did not finish within {}s", timeout.as_secs())]
    Timeout {
        /// The command line.
        command: String,
        /// The timeout that expired.
        timeout: Duration,
    },

    /// An external tool exited unsuccessfully.
    #[error("{command} failed ({status})")]
    ToolFailed {
        /// The command line.
        command: String,
        /// Exit status description.
        status: String,
        /// De-duplicated failure lines from the tool's output.
        diagnostics: Vec<String>,
    },

    /// A file was locked by another process.
    #[error("Resource busy: {message}")]
    ResourceBusy {
        /// What was locked.
        message: String,
    },

    /// The compiler argument file could not be written.
    #[error("Failed to write compiler argument file: {source}")]
    ArgFileError {
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The delegated build produced no archive or exploded directory.
    #[error("No build artifact found (searched {})", searched.join(", "))]
    ArtifactNotFound {
        /// Locations that were searched.
        searched: Vec<String>,
    },

    /// The target directory is empty after deployment.
    #[error("Deploy target {} is empty after the build", target.display())]
    ArtifactNotConfirmed {
        /// The target directory.
        target: PathBuf,
    },

    /// The server controller refused to stop the server.
    #[error("Server could not be stopped: {message}")]
    ServerError {
        /// Controller message.
        message: String,
    },

    /// Copying into the target failed.
    #[error(transparent)]
    Copy(#[from] CopyError),

    /// A mapping destination could not be prepared.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl BuildError {
    /// Whether the failure was caused by a file held by another process.
    #[must_use]
    pub fn is_resource_busy(&self) -> bool {
        match self {
            Self::ResourceBusy { .. } => true,
            Self::Copy(e) => e.io_error().is_some_and(is_busy_io),
            Self::Resolve(ResolveError::CreateParent { source, .. }) => is_busy_io(source),
            Self::SpawnError { source, .. } | Self::ArgFileError { source } => is_busy_io(source),
            _ => false,
        }
    }

    /// Diagnostic lines to show the user.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            Self::ToolFailed { diagnostics, .. } if !diagnostics.is_empty() => {
                diagnostics.clone()
            }
            _ => vec![self.to_string()],
        }
    }
}

/// Whether `error` means a file is locked by someone else.
///
/// Covers `EBUSY`/`ETXTBSY` on Unix and sharing violations on Windows.
#[must_use]
pub fn is_busy_io(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::ResourceBusy {
        return true;
    }
    let code = error.raw_os_error();
    if cfg!(windows) {
        matches!(code, Some(32 | 33))
    } else {
        matches!(code, Some(16 | 26))
    }
}
