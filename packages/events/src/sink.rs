//! Event sinks.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::{Mutex, PoisonError};

use crate::DeployEvent;

/// Receiver for deployment events.
pub trait DeployEvents: Send + Sync {
    /// Handle one event.
    fn emit(&self, event: DeployEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl DeployEvents for NoopEvents {
    fn emit(&self, _event: DeployEvent) {}
}

/// Sink that forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEvents;

impl DeployEvents for LogEvents {
    fn emit(&self, event: DeployEvent) {
        match &event {
            DeployEvent::BuildFailed { .. } | DeployEvent::ConfigReloadFailed { .. } => {
                log::error!("{event}");
            }
            DeployEvent::WatchRootSkipped { .. }
            | DeployEvent::PatternRejected { .. }
            | DeployEvent::BuildRetry { .. }
            | DeployEvent::BuildIgnored { .. } => log::warn!("{event}"),
            DeployEvent::MappingMatched { .. } | DeployEvent::DeleteIgnored { .. } => {
                log::debug!("{event}");
            }
            _ => log::info!("{event}"),
        }
    }
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<DeployEvent>>,
}

impl RecordingEvents {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event received so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<DeployEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Count the events accepted by `predicate`.
    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&DeployEvent) -> bool,
    {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| predicate(e))
            .count()
    }
}

impl DeployEvents for RecordingEvents {
    fn emit(&self, event: DeployEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_events_keeps_order() {
        let sink = RecordingEvents::new();
        sink.emit(DeployEvent::BatchExecuted { files: 1 });
        sink.emit(DeployEvent::BatchExecuted { files: 2 });

        assert_eq!(
            sink.events(),
            vec![
                DeployEvent::BatchExecuted { files: 1 },
                DeployEvent::BatchExecuted { files: 2 },
            ]
        );
        assert_eq!(
            sink.count(|e| matches!(e, DeployEvent::BatchExecuted { files } if *files > 1)),
            1
        );
    }
}
