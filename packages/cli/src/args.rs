//! CLI argument definitions.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use smartdeploy_config::StrategyPreference;

/// CLI arguments for smartdeploy.
#[derive(Debug, Parser)]
#[command(
    name = "smartdeploy",
    about = "Watch a servlet webapp project and deploy changes as they happen",
    version
)]
pub struct Args {
    /// Project directory (defaults to the nearest enclosing project).
    #[arg(long, short = 'p', global = true)]
    pub project: Option<PathBuf>,

    /// Print deploy events as JSON lines instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable the build spinner (useful for CI environments).
    #[arg(long = "no-progress", global = true)]
    pub no_progress: bool,

    /// Enable verbose output.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// What to do.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the detected project layout.
    Detect,

    /// List the compiled mappings with their matchers.
    Mappings,

    /// Write a starter mapping file.
    Init,

    /// Deploy changes as they happen until interrupted.
    Watch {
        /// Deployed webapp directory, relative to the project root
        /// (overrides deployDir/serverHome).
        #[arg(long)]
        target: Option<PathBuf>,
    },

    /// Run a full build into the deployed webapp.
    Deploy {
        /// Build strategy: auto, local, maven or gradle.
        #[arg(long, short = 's')]
        strategy: Option<StrategyPreference>,

        /// Deployed webapp directory (overrides deployDir/serverHome).
        #[arg(long)]
        target: Option<PathBuf>,
    },
}

impl Args {
    /// Determine if we should show the build spinner.
    ///
    /// JSON output keeps the terminal free of anything but event lines.
    #[must_use]
    pub const fn should_show_progress(&self) -> bool {
        !self.no_progress && !self.json
    }
}
