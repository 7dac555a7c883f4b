//! Structured deployment events for smartdeploy.
//!
//! The engine never renders UI. Every component reports what it did through a
//! [`DeployEvents`] sink; the binary decides whether events become log lines,
//! colored terminal output, or an NDJSON stream.
//!
//! # Example
//!
//! ```rust,ignore
//! use smartdeploy_events::{DeployEvent, DeployEvents, LogEvents};
//!
//! let sink = LogEvents;
//! sink.emit(DeployEvent::BatchExecuted { files: 3 });
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod sink;

pub use sink::{DeployEvents, LogEvents, NoopEvents, RecordingEvents};

use serde::Serialize;

/// Event emitted by the watch scheduler or the build pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DeployEvent {
    /// Watching started on the given roots.
    WatchStarted {
        /// Roots registered with the file watcher.
        roots: Vec<String>,
    },
    /// A watch root was not registered.
    WatchRootSkipped {
        /// The root that was skipped.
        root: String,
        /// Why it was skipped.
        reason: String,
    },
    /// A mapping pattern could not be compiled and will never match.
    PatternRejected {
        /// The offending source pattern.
        pattern: String,
        /// Diagnostic from the pattern compiler.
        reason: String,
    },
    /// A file matched a mapping and was deployed.
    MappingMatched {
        /// Source file.
        source: String,
        /// Destination file.
        destination: String,
        /// Description of the mapping that matched.
        mapping: String,
    },
    /// A delete event was observed. Deployed copies are left in place.
    DeleteIgnored {
        /// The deleted source path.
        path: String,
    },
    /// The compiled-artifact channel drained a batch.
    BatchExecuted {
        /// Number of files in the batch.
        files: usize,
    },
    /// A post-edit rescan found freshly compiled artifacts.
    RescanMatched {
        /// The edited source file.
        source: String,
        /// Number of artifacts fed into the compiled channel.
        artifacts: usize,
    },
    /// Mapping configuration was rebuilt and swapped in.
    ConfigReloaded {
        /// Number of compiled mappings now active.
        mappings: usize,
    },
    /// Mapping configuration could not be rebuilt; the previous set stays active.
    ConfigReloadFailed {
        /// Error message.
        message: String,
    },
    /// A build started.
    BuildStarted {
        /// Strategy name.
        strategy: String,
    },
    /// A build hit a locked file and will be retried.
    BuildRetry {
        /// Attempt that failed (1-based).
        attempt: u32,
        /// Lock diagnostic.
        reason: String,
    },
    /// A build failed.
    BuildFailed {
        /// Aggregated, de-duplicated diagnostic lines.
        diagnostics: Vec<String>,
    },
    /// A build succeeded and the target holds the new artifact.
    BuildSucceeded {
        /// Deployed artifact directory.
        artifact: String,
    },
    /// A build trigger arrived while another build was running.
    BuildIgnored {
        /// Strategy of the rejected trigger.
        strategy: String,
    },
    /// The server should reload the deployed application.
    ReloadRequested {
        /// What caused the request.
        reason: String,
    },
}

impl DeployEvent {
    /// Serialize the event as a single NDJSON line.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Whether the event reports a user-visible failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::BuildFailed { .. } | Self::ConfigReloadFailed { .. })
    }
}

impl std::fmt::Display for DeployEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WatchStarted { roots } => write!(f, "watching {} roots", roots.len()),
            Self::WatchRootSkipped { root, reason } => {
                write!(f, "watch root skipped: {root} ({reason})")
            }
            Self::PatternRejected { pattern, reason } => {
                write!(f, "pattern rejected: {pattern} ({reason})")
            }
            Self::MappingMatched {
                source,
                destination,
                ..
            } => write!(f, "mapping matched: {source} -> {destination}"),
            Self::DeleteIgnored { path } => write!(f, "delete ignored: {path}"),
            Self::BatchExecuted { files } => write!(f, "batch executed: {files} files"),
            Self::RescanMatched { source, artifacts } => {
                write!(f, "rescan after {source}: {artifacts} artifacts")
            }
            Self::ConfigReloaded { mappings } => write!(f, "config reloaded: {mappings} mappings"),
            Self::ConfigReloadFailed { message } => write!(f, "config reload failed: {message}"),
            Self::BuildStarted { strategy } => write!(f, "build started: {strategy}"),
            Self::BuildRetry { attempt, reason } => {
                write!(f, "build attempt {attempt} hit a locked file: {reason}")
            }
            Self::BuildFailed { diagnostics } => {
                write!(f, "build failed: {}", diagnostics.join("\n"))
            }
            Self::BuildSucceeded { artifact } => write!(f, "build succeeded: {artifact}"),
            Self::BuildIgnored { strategy } => {
                write!(f, "build ignored ({strategy}): another build is running")
            }
            Self::ReloadRequested { reason } => write!(f, "reload requested: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_is_tagged() {
        let json = DeployEvent::BatchExecuted { files: 3 }.to_json();
        assert_eq!(json, r#"{"event":"batch_executed","files":3}"#);
    }

    #[test]
    fn test_display_build_failed_joins_lines() {
        let event = DeployEvent::BuildFailed {
            diagnostics: vec!["Foo.java:3: error".to_string(), "1 error".to_string()],
        };
        assert_eq!(event.to_string(), "build failed: Foo.java:3: error\n1 error");
        assert!(event.is_failure());
    }
}
