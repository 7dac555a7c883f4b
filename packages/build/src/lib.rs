//! Full-build pipeline for smartdeploy.
//!
//! A build produces a complete webapp in the deploy target using one of
//! three strategies:
//!
//! * **Local**: sync the web roots, overlay resources, compile every source
//!   with one `javac` call and apply the local mappings.
//! * **Maven** / **Gradle**: run the project's build tool and unpack the
//!   archive (or copy the exploded directory) it leaves behind.
//!
//! [`BuildExecutor`] runs one build at a time. Failures caused by files
//! locked by another process are retried up to [`MAX_ATTEMPTS`] times, and
//! lock holders are terminated before each retry.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod collaborators;
mod delegate;
mod diagnostics;
mod error;
mod executor;
mod local;
mod runner;
mod strategy;

pub use collaborators::{DetachedServer, PatternTerminator, ProcessTerminator, ServerController};
pub use delegate::{Artifact, build_delegated, deploy_artifact, find_build_tool, locate_artifact};
pub use diagnostics::{extract_diagnostics, mentions_busy_resource};
pub use error::{BuildError, is_busy_io};
pub use executor::{BuildExecutor, BuildOutcome, MAX_ATTEMPTS};
pub use local::{
    PROTECTED_DIRS, arg_file_contents, build_local, classpath_entries, collect_sources,
    find_javac, overlay_local_mappings,
};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use strategy::{BuildStrategy, Platform};
