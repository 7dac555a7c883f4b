//! Progress display for full builds.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::io::Write;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// Spinner manager for long-running builds.
pub struct ProgressManager {
    enabled: bool,
}

impl ProgressManager {
    /// Create a new progress manager.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Create a spinner for a build that runs an external tool.
    ///
    /// If progress is disabled, returns a hidden progress bar.
    #[must_use]
    pub fn create_build_spinner(&self, label: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {prefix:<30} {elapsed:.dim} {msg}")
                .expect("Invalid progress bar template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
        );
        pb.set_prefix(label.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Print a result with file count for a finished build.
    pub fn print_result_with_count(&self, label: &str, result: &str, file_count: u64) {
        println!(
            "{} {:<30} {} ({} files)",
            "✓".green(),
            label,
            result.dimmed(),
            file_count
        );
        let _ = std::io::stdout().flush();
    }
}
