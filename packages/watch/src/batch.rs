//! Debounced batch of compiled-artifact events.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::source::{FsEvent, FsEventKind};

/// Events waiting for the compiled-artifact channel to go quiet.
///
/// Holds one entry per path (the latest kind wins) and a single deadline.
/// Every push re-arms the deadline to `now + window`, replacing the previous
/// one. Time is passed in so callers and tests control the clock.
#[derive(Debug)]
pub struct PendingBatch {
    members: BTreeMap<PathBuf, FsEventKind>,
    deadline: Option<Instant>,
    window: Duration,
}

impl PendingBatch {
    /// Create an empty batch with the given quiet period.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            members: BTreeMap::new(),
            deadline: None,
            window,
        }
    }

    /// Change the quiet period used by later pushes.
    pub const fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Add an event and re-arm the deadline.
    pub fn push(&mut self, event: FsEvent, now: Instant) {
        self.members.insert(event.path, event.kind);
        self.deadline = Some(now + self.window);
    }

    /// The armed deadline, if any event is pending.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the quiet period has elapsed at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Take every member, in path order, and release the deadline.
    pub fn drain(&mut self) -> Vec<FsEvent> {
        self.deadline = None;
        std::mem::take(&mut self.members)
            .into_iter()
            .map(|(path, kind)| FsEvent { path, kind })
            .collect()
    }

    /// Number of distinct paths pending.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_drains_once_after_last_event() {
        let start = Instant::now();
        let mut batch = PendingBatch::new(ms(300));

        batch.push(FsEvent::new("/p/A.class", FsEventKind::Create), start);
        batch.push(FsEvent::new("/p/A$1.class", FsEventKind::Create), start + ms(100));
        batch.push(FsEvent::new("/p/B.class", FsEventKind::Change), start + ms(150));

        assert!(!batch.is_due(start + ms(300)));
        assert!(!batch.is_due(start + ms(449)));
        assert!(batch.is_due(start + ms(450)));
        assert_eq!(batch.deadline(), Some(start + ms(450)));

        let drained = batch.drain();
        assert_eq!(drained.len(), 3);
        assert!(batch.is_empty());
        assert_eq!(batch.deadline(), None);
        assert!(!batch.is_due(start + ms(1000)));
    }

    #[test]
    fn test_same_path_keeps_latest_kind() {
        let start = Instant::now();
        let mut batch = PendingBatch::new(ms(300));

        batch.push(FsEvent::new("/p/A.class", FsEventKind::Create), start);
        batch.push(FsEvent::new("/p/A.class", FsEventKind::Delete), start + ms(10));

        assert_eq!(batch.len(), 1);
        assert_eq!(
            batch.drain(),
            vec![FsEvent::new("/p/A.class", FsEventKind::Delete)]
        );
    }

    #[test]
    fn test_window_change_applies_to_next_push() {
        let start = Instant::now();
        let mut batch = PendingBatch::new(ms(300));

        batch.push(FsEvent::new("/p/A.class", FsEventKind::Create), start);
        batch.set_window(ms(50));
        batch.push(FsEvent::new("/p/B.class", FsEventKind::Create), start + ms(10));

        assert!(batch.is_due(start + ms(60)));
    }
}
