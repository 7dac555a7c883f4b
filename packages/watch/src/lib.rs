//! Dual-channel watch scheduler for smartdeploy.
//!
//! Filesystem events are routed to one of two channels:
//!
//! * **Static**: web resources and other non-compiled files are deployed as
//!   soon as their event arrives.
//! * **Compiled**: `.class` files under the output root are collected into a
//!   [`PendingBatch`] and deployed together once no event has arrived for the
//!   debounce window.
//!
//! A `.java` edit schedules a few rescans of the output root so classes
//! written by an out-of-band compiler still reach the compiled channel.
//! Changes to `smartdeploy.toml` or the mapping file rebuild the
//! [`WatchSnapshot`] through a [`Reload`] implementation and swap it in
//! atomically.
//!
//! Delete events are reported and otherwise ignored: deployed copies are
//! never removed by the incremental channels.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use smartdeploy_events::LogEvents;
//! use smartdeploy_watch::{ConfigReloader, WatchSnapshot, watch};
//!
//! let snapshot = WatchSnapshot::from_config(&config, &webapp);
//! let reloader = ConfigReloader::new(config.project_root(), &webapp);
//! let handle = watch(snapshot, Some(Box::new(reloader)), Arc::new(LogEvents))?;
//! // ... runs until `handle` is dropped
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod batch;
mod deploy;
mod error;
mod plan;
mod rescan;
mod route;
mod scheduler;
mod snapshot;
mod source;

#[cfg(test)]
mod test_support;

pub use batch::PendingBatch;
pub use deploy::{DeployOutcome, deploy_batch, deploy_event, deploy_file};
pub use error::WatchError;
pub use plan::{SkippedRoot, WatchPlan, plan_watch_roots};
pub use rescan::{RescanProbe, RescanQueue, find_fresh_artifacts};
pub use route::{COMPILED_EXTENSION, IgnoreReason, Route, SOURCE_EXTENSION, route};
pub use scheduler::{SchedulerHandle, start, watch};
pub use snapshot::{ConfigReloader, Reload, WatchSnapshot};
pub use source::{FsEvent, FsEventKind, ManualWatchSource, NotifyWatchSource, WatchSource};
