//! Filesystem event sources.
//!
//! The scheduler consumes a typed stream of [`FsEvent`]s from a
//! `crossbeam-channel` receiver and does not care how it is produced.
//! [`NotifyWatchSource`] feeds it from the platform watcher;
//! [`ManualWatchSource`] lets callers push events themselves.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender, unbounded};
use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::WatchError;
use crate::plan::WatchPlan;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FsEventKind {
    /// The file appeared.
    Create,
    /// The file's content changed.
    Change,
    /// The file went away.
    Delete,
}

impl std::fmt::Display for FsEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Change => write!(f, "change"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A single filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    /// Absolute path of the changed file.
    pub path: PathBuf,
    /// What happened.
    pub kind: FsEventKind,
}

impl FsEvent {
    /// Create an event.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: FsEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Producer of filesystem events.
///
/// The source must stay alive for as long as events are wanted; the
/// scheduler keeps it inside its handle.
pub trait WatchSource: Send {
    /// Receiver the scheduler reads events from.
    fn events(&self) -> Receiver<FsEvent>;
}

/// Event source backed by the platform file watcher.
pub struct NotifyWatchSource {
    _watcher: RecommendedWatcher,
    receiver: Receiver<FsEvent>,
}

impl NotifyWatchSource {
    /// Start watching every root in `plan`.
    ///
    /// Roots are watched recursively. Configuration files are watched through
    /// their parent directory, non-recursively, when that directory exists.
    ///
    /// # Errors
    ///
    /// * If the platform watcher cannot be created
    /// * If a root cannot be registered
    pub fn new(plan: &WatchPlan) -> Result<Self, WatchError> {
        let (sender, receiver) = unbounded();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => forward(&event, &sender),
                Err(e) => log::warn!("File watcher error: {e}"),
            }
        })
        .map_err(|source| WatchError::WatcherError { source })?;

        for root in &plan.roots {
            log::debug!("Watching {}", root.display());
            watcher
                .watch(root, RecursiveMode::Recursive)
                .map_err(|source| WatchError::WatchRootError {
                    path: root.clone(),
                    source,
                })?;
        }

        for dir in &plan.config_dirs {
            if plan.roots.iter().any(|root| dir.starts_with(root)) {
                continue;
            }
            log::debug!("Watching configuration directory {}", dir.display());
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|source| WatchError::WatchRootError {
                    path: dir.clone(),
                    source,
                })?;
        }

        Ok(Self {
            _watcher: watcher,
            receiver,
        })
    }
}

impl WatchSource for NotifyWatchSource {
    fn events(&self) -> Receiver<FsEvent> {
        self.receiver.clone()
    }
}

fn forward(event: &notify::Event, sender: &Sender<FsEvent>) {
    let send = |path: &Path, kind: FsEventKind| {
        if kind != FsEventKind::Delete && path.is_dir() {
            return;
        }
        // The scheduler may already be gone during shutdown.
        let _ = sender.send(FsEvent::new(path, kind));
    };

    match event.kind {
        EventKind::Create(_) => {
            for path in &event.paths {
                send(path, FsEventKind::Create);
            }
        }
        EventKind::Modify(ModifyKind::Metadata(_)) | EventKind::Access(_) => {}
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
            for path in &event.paths {
                send(path, FsEventKind::Delete);
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            for path in &event.paths {
                send(path, FsEventKind::Create);
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if let [from, to] = event.paths.as_slice() {
                send(from, FsEventKind::Delete);
                send(to, FsEventKind::Create);
            }
        }
        EventKind::Modify(_) | EventKind::Any | EventKind::Other => {
            for path in &event.paths {
                if path.exists() {
                    send(path, FsEventKind::Change);
                } else {
                    send(path, FsEventKind::Delete);
                }
            }
        }
    }
}

/// Event source fed by the caller.
#[derive(Debug, Clone)]
pub struct ManualWatchSource {
    sender: Sender<FsEvent>,
    receiver: Receiver<FsEvent>,
}

impl ManualWatchSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Queue an event.
    pub fn push(&self, path: impl Into<PathBuf>, kind: FsEventKind) {
        let _ = self.sender.send(FsEvent::new(path, kind));
    }

    /// Sender for producing events from another thread.
    #[must_use]
    pub fn sender(&self) -> Sender<FsEvent> {
        self.sender.clone()
    }
}

impl Default for ManualWatchSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchSource for ManualWatchSource {
    fn events(&self) -> Receiver<FsEvent> {
        self.receiver.clone()
    }
}
