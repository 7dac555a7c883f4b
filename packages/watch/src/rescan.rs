//! Post-edit rescans of the compiled output root.
//!
//! Compilers that write classes out of band do not always produce events the
//! watcher sees. After a source edit the output root is probed a few times at
//! increasing offsets for classes newer than the edit. Running out of probes
//! is not an error.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::route::COMPILED_EXTENSION;
use crate::snapshot::WatchSnapshot;

/// Classes compiled from `source` that were written at or after `since`.
///
/// Matches `Foo.class` and nested `Foo$*.class`. When `source` lies under a
/// source root only its package directory is read; otherwise the whole
/// output root is walked.
#[must_use]
pub fn find_fresh_artifacts(
    snapshot: &WatchSnapshot,
    source: &Path,
    since: SystemTime,
) -> Vec<PathBuf> {
    let Some(stem) = source.file_stem().map(|s| s.to_string_lossy().to_string()) else {
        return Vec::new();
    };
    let exact = format!("{stem}.{COMPILED_EXTENSION}");
    let nested = format!("{stem}$");
    let is_artifact = |name: &str| {
        name == exact
            || (name.starts_with(&nested) && name.ends_with(&format!(".{COMPILED_EXTENSION}")))
    };
    let is_fresh = |path: &Path| {
        fs::metadata(path)
            .and_then(|m| m.modified())
            .is_ok_and(|modified| modified >= since)
    };

    let package_dir = snapshot
        .source_roots
        .iter()
        .find_map(|root| source.strip_prefix(root).ok())
        .and_then(Path::parent)
        .map(|package| snapshot.output_root.join(package));

    let candidates: Vec<PathBuf> = match package_dir {
        Some(dir) => fs::read_dir(&dir)
            .map(|entries| entries.filter_map(Result::ok).map(|e| e.path()).collect())
            .unwrap_or_default(),
        None => jwalk::WalkDir::new(&snapshot.output_root)
            .skip_hidden(false)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path())
            .collect(),
    };

    let mut found: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|path| {
            path.file_name()
                .is_some_and(|name| is_artifact(&name.to_string_lossy()))
        })
        .filter(|path| path.is_file() && is_fresh(path))
        .collect();
    found.sort();
    found
}

#[derive(Debug)]
struct PendingRescan {
    source: PathBuf,
    since: SystemTime,
    started: Instant,
    next_probe: usize,
}

/// A probe that is due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescanProbe {
    /// Edited source file.
    pub source: PathBuf,
    /// Only classes written at or after this time count.
    pub since: SystemTime,
    /// Whether this is the last probe for the source.
    pub last: bool,
}

/// Outstanding rescans, one per edited source.
///
/// Probes are scheduled at `started + delays[i]`. A new edit of the same
/// source restarts its schedule.
#[derive(Debug, Default)]
pub struct RescanQueue {
    pending: Vec<PendingRescan>,
}

impl RescanQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule probes for an edit of `source`.
    pub fn schedule(&mut self, source: PathBuf, now: Instant) {
        let since = fs::metadata(&source)
            .and_then(|m| m.modified())
            .unwrap_or_else(|_| SystemTime::now());
        self.pending.retain(|p| p.source != source);
        self.pending.push(PendingRescan {
            source,
            since,
            started: now,
            next_probe: 0,
        });
    }

    /// Earliest time a probe is due.
    #[must_use]
    pub fn next_deadline(&self, delays: &[Duration]) -> Option<Instant> {
        self.pending
            .iter()
            .filter_map(|p| delays.get(p.next_probe).map(|d| p.started + *d))
            .min()
    }

    /// Take the probes due at `now`.
    ///
    /// Sources whose probes are exhausted are dropped from the queue.
    pub fn due(&mut self, now: Instant, delays: &[Duration]) -> Vec<RescanProbe> {
        let mut probes = Vec::new();
        for pending in &mut self.pending {
            let Some(delay) = delays.get(pending.next_probe) else {
                continue;
            };
            if now < pending.started + *delay {
                continue;
            }
            pending.next_probe += 1;
            probes.push(RescanProbe {
                source: pending.source.clone(),
                since: pending.since,
                last: pending.next_probe >= delays.len(),
            });
        }
        self.pending.retain(|p| p.next_probe < delays.len());
        probes
    }

    /// Stop probing for `source`.
    pub fn finish(&mut self, source: &Path) {
        self.pending.retain(|p| p.source != source);
    }

    /// Whether nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
