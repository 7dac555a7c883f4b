//! Progress reporting for target updates.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// What a progress report is counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPhase {
    /// Copying files from a directory.
    Copying,
    /// Unpacking entries from an archive.
    Extracting,
}

impl std::fmt::Display for CopyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Copying => write!(f, "copying"),
            Self::Extracting => write!(f, "extracting"),
        }
    }
}

/// Progress information for a copy or extraction.
#[derive(Debug, Clone)]
pub struct CopyProgress {
    /// What is being counted.
    pub phase: CopyPhase,
    /// Total number of files.
    pub files_total: u64,
    /// Number of files done so far.
    pub files_done: u64,
    /// Current file (if any).
    pub current_file: Option<String>,
}

impl CopyProgress {
    /// Create a new progress report.
    #[must_use]
    pub const fn new(
        phase: CopyPhase,
        files_total: u64,
        files_done: u64,
        current_file: Option<String>,
    ) -> Self {
        Self {
            phase,
            files_total,
            files_done,
            current_file,
        }
    }

    /// One-line summary, e.g. `copying 12/40`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} {}/{}", self.phase, self.files_done, self.files_total)
    }
}

/// Thread-safe counter shared by parallel copy workers.
#[derive(Debug)]
pub struct ProgressTracker {
    phase: CopyPhase,
    files_total: AtomicU64,
    files_done: AtomicU64,
}

impl ProgressTracker {
    /// Create a tracker for `phase`.
    #[must_use]
    pub fn new(phase: CopyPhase) -> Arc<Self> {
        Arc::new(Self {
            phase,
            files_total: AtomicU64::new(0),
            files_done: AtomicU64::new(0),
        })
    }

    /// Set the total number of files.
    pub fn set_total(&self, total: u64) {
        self.files_total.store(total, Ordering::SeqCst);
    }

    /// Record one more finished file and return the new count.
    pub fn increment(&self) -> u64 {
        self.files_done.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Get a progress snapshot.
    #[must_use]
    pub fn snapshot(&self, current_file: Option<String>) -> CopyProgress {
        CopyProgress::new(
            self.phase,
            self.files_total.load(Ordering::SeqCst),
            self.files_done.load(Ordering::SeqCst),
            current_file,
        )
    }
}
