//! Watch-root planning.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use crate::snapshot::WatchSnapshot;

/// A root that will not be watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRoot {
    /// The root.
    pub root: PathBuf,
    /// Why it was skipped.
    pub reason: String,
}

/// Directories to register with the file watcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchPlan {
    /// Roots watched recursively, none nested inside another.
    pub roots: Vec<PathBuf>,
    /// Existing directories holding configuration files, watched flat.
    pub config_dirs: Vec<PathBuf>,
    /// Candidates that were dropped.
    pub skipped: Vec<SkippedRoot>,
    /// Watched roots that contain the deploy target. Events from the target
    /// are dropped during routing.
    pub covering_target: Vec<PathBuf>,
}

/// Plan watch roots for `snapshot`.
///
/// Candidates are the literal directory of every usable mapping plus the
/// output and source roots. Duplicates and roots nested under another
/// candidate collapse into the outer root; missing directories are skipped.
#[must_use]
pub fn plan_watch_roots(snapshot: &WatchSnapshot) -> WatchPlan {
    let mut plan = WatchPlan::default();

    let mut candidates: Vec<PathBuf> = Vec::new();
    for mapping in &snapshot.mappings {
        // Refused patterns match nothing and are reported on their own.
        if mapping.diagnostic().is_some() {
            continue;
        }
        candidates.push(snapshot.project_root.join(mapping.segments.base_directory()));
    }
    candidates.push(snapshot.output_root.clone());
    candidates.extend(snapshot.source_roots.iter().cloned());

    candidates.sort();
    candidates.dedup();

    for candidate in candidates {
        if !candidate.is_dir() {
            plan.skipped.push(SkippedRoot {
                root: candidate,
                reason: "directory does not exist".to_string(),
            });
            continue;
        }
        // Sorted order puts a parent before anything nested in it.
        if plan.roots.iter().any(|root| candidate.starts_with(root)) {
            log::debug!("{} is covered by another root", candidate.display());
            continue;
        }
        if snapshot.webapp_root.starts_with(&candidate) {
            log::warn!(
                "Watch root {} contains the deploy target {}; deployed files are ignored",
                candidate.display(),
                snapshot.webapp_root.display()
            );
            plan.covering_target.push(candidate.clone());
        }
        plan.roots.push(candidate);
    }

    for file in &snapshot.config_files {
        let Some(dir) = file.parent() else {
            continue;
        };
        if dir.is_dir() && !plan.config_dirs.iter().any(|d| d == dir) {
            plan.config_dirs.push(dir.to_path_buf());
        }
    }

    plan
}
