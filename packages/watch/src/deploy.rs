//! Deploying matched files into the webapp.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::Path;

use smartdeploy_copy::{CopyResult, overwrite_file};
use smartdeploy_events::{DeployEvent, DeployEvents};
use smartdeploy_mapping::resolve;

use crate::snapshot::WatchSnapshot;
use crate::source::{FsEvent, FsEventKind};

/// What deploying one or more events did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOutcome {
    /// Files written into the webapp.
    pub copied: usize,
    /// Whether a mapping that requires a reload matched.
    pub reload: bool,
}

impl DeployOutcome {
    fn merge(&mut self, other: Self) {
        self.copied += other.copied;
        self.reload |= other.reload;
    }
}

/// Copy `path` to the destination of every mapping that accepts it.
///
/// Copy failures are logged and skipped; a source that disappeared before
/// the copy is a no-op.
pub fn deploy_file(snapshot: &WatchSnapshot, path: &Path, events: &dyn DeployEvents) -> DeployOutcome {
    let mut outcome = DeployOutcome::default();

    for mapping in snapshot
        .mappings
        .iter()
        .filter(|m| m.matches_path(path, &snapshot.project_root))
    {
        let destination = match resolve(mapping, path, &snapshot.project_root, &snapshot.webapp_root)
        {
            Ok(destination) => destination,
            Err(e) => {
                log::warn!("{e}");
                continue;
            }
        };

        match overwrite_file(path, &destination) {
            Ok(CopyResult::Created { .. }) => {
                outcome.copied += 1;
                outcome.reload |= mapping.mapping.triggers_reload;
                events.emit(DeployEvent::MappingMatched {
                    source: path.display().to_string(),
                    destination: destination.display().to_string(),
                    mapping: mapping.mapping.to_string(),
                });
            }
            Ok(CopyResult::SourceNotFound) => {
                log::debug!("{} vanished before it could be copied", path.display());
            }
            Err(e) => log::warn!("{e}"),
        }
    }

    if outcome.copied == 0 {
        log::trace!("No mapping deployed {}", path.display());
    }
    outcome
}

/// Deploy one event. Deletes are reported and leave deployed copies alone.
pub fn deploy_event(
    snapshot: &WatchSnapshot,
    event: &FsEvent,
    events: &dyn DeployEvents,
) -> DeployOutcome {
    if event.kind == FsEventKind::Delete {
        events.emit(DeployEvent::DeleteIgnored {
            path: event.path.display().to_string(),
        });
        return DeployOutcome::default();
    }
    deploy_file(snapshot, &event.path, events)
}

/// Deploy a drained batch, then report it and request a reload if needed.
pub fn deploy_batch(
    snapshot: &WatchSnapshot,
    batch: &[FsEvent],
    events: &dyn DeployEvents,
) -> DeployOutcome {
    let mut outcome = DeployOutcome::default();
    for event in batch {
        outcome.merge(deploy_event(snapshot, event, events));
    }

    events.emit(DeployEvent::BatchExecuted { files: batch.len() });
    if outcome.reload {
        events.emit(DeployEvent::ReloadRequested {
            reason: format!("{} compiled files deployed", outcome.copied),
        });
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::snapshot;
    use smartdeploy_events::RecordingEvents;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_deploy_file_preserves_package_structure() {
        let dir = TempDir::new().unwrap();
        let snapshot = snapshot(dir.path());
        let class = dir.path().join("target/classes/com/example/Foo.class");
        fs::create_dir_all(class.parent().unwrap()).unwrap();
        fs::write(&class, "bytecode").unwrap();
        let events = RecordingEvents::new();

        let outcome = deploy_file(&snapshot, &class, &events);

        assert_eq!(outcome, DeployOutcome { copied: 1, reload: true });
        assert_eq!(
            fs::read_to_string(dir.path().join("deploy/WEB-INF/classes/com/example/Foo.class"))
                .unwrap(),
            "bytecode"
        );
        assert_eq!(
            events.count(|e| matches!(e, DeployEvent::MappingMatched { .. })),
            1
        );
    }

    #[test]
    fn test_deploy_event_ignores_deletes() {
        let dir = TempDir::new().unwrap();
        let snapshot = snapshot(dir.path());
        fs::create_dir_all(dir.path().join("deploy")).unwrap();
        fs::write(dir.path().join("deploy/index.jsp"), "deployed").unwrap();
        let events = RecordingEvents::new();

        let outcome = deploy_event(
            &snapshot,
            &FsEvent::new(dir.path().join("src/main/webapp/index.jsp"), FsEventKind::Delete),
            &events,
        );

        assert_eq!(outcome, DeployOutcome::default());
        assert!(dir.path().join("deploy/index.jsp").is_file());
        assert_eq!(
            events.count(|e| matches!(e, DeployEvent::DeleteIgnored { .. })),
            1
        );
    }

    #[test]
    fn test_deploy_batch_without_reload_mapping() {
        let dir = TempDir::new().unwrap();
        let snapshot = snapshot(dir.path());
        let jsp = dir.path().join("src/main/webapp/index.jsp");
        fs::create_dir_all(jsp.parent().unwrap()).unwrap();
        fs::write(&jsp, "page").unwrap();
        let events = RecordingEvents::new();

        let outcome = deploy_batch(
            &snapshot,
            &[
                FsEvent::new(&jsp, FsEventKind::Change),
                FsEvent::new(dir.path().join("src/main/webapp/gone.jsp"), FsEventKind::Change),
            ],
            &events,
        );

        assert_eq!(outcome.copied, 1);
        assert!(dir.path().join("deploy/index.jsp").is_file());
        assert_eq!(
            events.events().last(),
            Some(&DeployEvent::BatchExecuted { files: 2 })
        );
        assert_eq!(
            events.count(|e| matches!(e, DeployEvent::ReloadRequested { .. })),
            0
        );
    }
}
