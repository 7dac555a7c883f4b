//! The dual-channel scheduler.
//!
//! ```text
//! WatchSource -> dispatcher -+-> static worker    (deploy now)
//!                            +-> compiled worker  (PendingBatch, drain on quiet)
//!                            +-> rescanner        (probe output root, feed compiled)
//! ```
//!
//! Every worker reads the current [`WatchSnapshot`] from one `ArcSwap`.
//! Configuration reloads replace the snapshot wholesale.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, select, unbounded};
use smartdeploy_events::{DeployEvent, DeployEvents};

use crate::batch::PendingBatch;
use crate::deploy::{deploy_batch, deploy_event};
use crate::error::WatchError;
use crate::plan::plan_watch_roots;
use crate::rescan::{RescanQueue, find_fresh_artifacts};
use crate::route::{Route, route};
use crate::snapshot::{Reload, WatchSnapshot};
use crate::source::{FsEvent, FsEventKind, NotifyWatchSource, WatchSource};

type SharedSnapshot = Arc<ArcSwap<WatchSnapshot>>;

/// Running scheduler. Dropping it stops every worker thread.
pub struct SchedulerHandle {
    snapshot: SharedSnapshot,
    stop: Option<Sender<()>>,
    threads: Vec<JoinHandle<()>>,
    _source: Box<dyn WatchSource>,
}

impl SchedulerHandle {
    /// The snapshot workers currently see.
    #[must_use]
    pub fn snapshot(&self) -> Arc<WatchSnapshot> {
        self.snapshot.load_full()
    }

    /// Stop the workers and wait for them to exit.
    ///
    /// A batch still waiting for its quiet period is dropped.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Disconnecting the stop channel wakes the dispatcher.
        self.stop.take();
        for thread in self.threads.drain(..) {
            if thread.join().is_err() {
                log::warn!("A watch worker panicked");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("threads", &self.threads.len())
            .finish_non_exhaustive()
    }
}

/// Plan watch roots for `snapshot`, attach the platform watcher and start.
///
/// Missing roots are reported as [`DeployEvent::WatchRootSkipped`] and
/// refused patterns as [`DeployEvent::PatternRejected`].
///
/// # Arguments
///
/// * `snapshot` - Initial configuration
/// * `reloader` - Rebuilds the snapshot when a configuration file changes
/// * `events` - Sink for everything the scheduler does
///
/// # Errors
///
/// * If no root can be watched
/// * If the platform watcher fails
/// * If a worker thread cannot be spawned
pub fn watch(
    snapshot: WatchSnapshot,
    reloader: Option<Box<dyn Reload>>,
    events: Arc<dyn DeployEvents>,
) -> Result<SchedulerHandle, WatchError> {
    for (pattern, reason) in snapshot.rejected_patterns() {
        events.emit(DeployEvent::PatternRejected { pattern, reason });
    }

    let plan = plan_watch_roots(&snapshot);
    for skipped in &plan.skipped {
        events.emit(DeployEvent::WatchRootSkipped {
            root: skipped.root.display().to_string(),
            reason: skipped.reason.clone(),
        });
    }
    if plan.roots.is_empty() {
        return Err(WatchError::NoWatchRoots {
            project_root: snapshot.project_root,
        });
    }

    let source = NotifyWatchSource::new(&plan)?;
    events.emit(DeployEvent::WatchStarted {
        roots: plan.roots.iter().map(|r| r.display().to_string()).collect(),
    });

    start(source, snapshot, reloader, events)
}

/// Start the scheduler on an arbitrary event source.
///
/// # Errors
///
/// * If a worker thread cannot be spawned
pub fn start<S>(
    source: S,
    snapshot: WatchSnapshot,
    reloader: Option<Box<dyn Reload>>,
    events: Arc<dyn DeployEvents>,
) -> Result<SchedulerHandle, WatchError>
where
    S: WatchSource + 'static,
{
    log::info!(
        "Starting watch scheduler for {} with {} mappings",
        snapshot.project_root.display(),
        snapshot.mappings.len()
    );

    let shared: SharedSnapshot = Arc::new(ArcSwap::from_pointee(snapshot));
    let (stop_tx, stop_rx) = unbounded::<()>();
    let (static_tx, static_rx) = unbounded::<FsEvent>();
    let (compiled_tx, compiled_rx) = unbounded::<FsEvent>();
    let (rescan_tx, rescan_rx) = unbounded::<PathBuf>();

    let mut threads = Vec::new();

    threads.push(spawn("smartdeploy-static", {
        let shared = Arc::clone(&shared);
        let events = Arc::clone(&events);
        move || run_static(&shared, &static_rx, events.as_ref())
    })?);

    threads.push(spawn("smartdeploy-compiled", {
        let shared = Arc::clone(&shared);
        let events = Arc::clone(&events);
        move || run_compiled(&shared, &compiled_rx, events.as_ref())
    })?);

    threads.push(spawn("smartdeploy-rescan", {
        let shared = Arc::clone(&shared);
        let events = Arc::clone(&events);
        let compiled_tx = compiled_tx.clone();
        move || run_rescan(&shared, &rescan_rx, &compiled_tx, events.as_ref())
    })?);

    let dispatcher = Dispatcher {
        shared: Arc::clone(&shared),
        reloader,
        events,
        static_tx,
        compiled_tx,
        rescan_tx,
    };
    let source_rx = source.events();
    threads.push(spawn("smartdeploy-dispatch", move || {
        dispatcher.run(&source_rx, &stop_rx);
    })?);

    Ok(SchedulerHandle {
        snapshot: shared,
        stop: Some(stop_tx),
        threads,
        _source: Box::new(source),
    })
}

fn spawn<F>(name: &str, body: F) -> Result<JoinHandle<()>, WatchError>
where
    F: FnOnce() + Send + 'static,
{
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map_err(|source| WatchError::SpawnError {
            name: name.to_string(),
            source,
        })
}

struct Dispatcher {
    shared: SharedSnapshot,
    reloader: Option<Box<dyn Reload>>,
    events: Arc<dyn DeployEvents>,
    static_tx: Sender<FsEvent>,
    compiled_tx: Sender<FsEvent>,
    rescan_tx: Sender<PathBuf>,
}

impl Dispatcher {
    fn run(&self, source: &Receiver<FsEvent>, stop: &Receiver<()>) {
        loop {
            select! {
                recv(source) -> message => match message {
                    Ok(event) => {
                        if !self.dispatch(event) {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                recv(stop) -> _ => break,
            }
        }
        log::debug!("Dispatcher stopped");
    }

    /// Route one event. Returns `false` once a worker has gone away.
    fn dispatch(&self, event: FsEvent) -> bool {
        let snapshot = self.shared.load();
        match route(&snapshot, &event.path) {
            Route::ConfigChanged => {
                self.reload(&event);
                true
            }
            Route::Ignored(reason) => {
                log::trace!("Ignoring {} ({reason:?})", event.path.display());
                true
            }
            Route::Static => self.static_tx.send(event).is_ok(),
            Route::Compiled => self.compiled_tx.send(event).is_ok(),
            Route::SourceEdit => {
                if event.kind == FsEventKind::Delete {
                    return true;
                }
                self.rescan_tx.send(event.path).is_ok()
            }
        }
    }

    fn reload(&self, event: &FsEvent) {
        let Some(reloader) = &self.reloader else {
            log::debug!(
                "{} changed but no reloader is configured",
                event.path.display()
            );
            return;
        };

        log::info!("{} changed, reloading mappings", event.path.display());
        match reloader.reload() {
            Ok(snapshot) => {
                for (pattern, reason) in snapshot.rejected_patterns() {
                    self.events
                        .emit(DeployEvent::PatternRejected { pattern, reason });
                }
                let mappings = snapshot.mappings.len();
                self.shared.store(Arc::new(snapshot));
                self.events.emit(DeployEvent::ConfigReloaded { mappings });
            }
            Err(e) => self.events.emit(DeployEvent::ConfigReloadFailed {
                message: e.to_string(),
            }),
        }
    }
}

fn run_static(shared: &SharedSnapshot, receiver: &Receiver<FsEvent>, events: &dyn DeployEvents) {
    for event in receiver {
        let snapshot = shared.load();
        let outcome = deploy_event(&snapshot, &event, events);
        if outcome.reload {
            events.emit(DeployEvent::ReloadRequested {
                reason: format!("{} deployed", event.path.display()),
            });
        }
    }
    log::debug!("Static channel stopped");
}

fn run_compiled(shared: &SharedSnapshot, receiver: &Receiver<FsEvent>, events: &dyn DeployEvents) {
    let mut batch = PendingBatch::new(shared.load().debounce_window);

    loop {
        let message = match batch.deadline() {
            Some(deadline) => receiver.recv_deadline(deadline),
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match message {
            Ok(event) => {
                batch.set_window(shared.load().debounce_window);
                batch.push(event, Instant::now());
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if batch.is_due(Instant::now()) {
            let members = batch.drain();
            log::debug!("Draining {} compiled artifacts", members.len());
            let snapshot = shared.load();
            deploy_batch(&snapshot, &members, events);
        }
    }

    if !batch.is_empty() {
        log::debug!("Dropping {} pending compiled artifacts", batch.len());
    }
    log::debug!("Compiled channel stopped");
}

fn run_rescan(
    shared: &SharedSnapshot,
    receiver: &Receiver<PathBuf>,
    compiled: &Sender<FsEvent>,
    events: &dyn DeployEvents,
) {
    let mut queue = RescanQueue::new();

    loop {
        let delays = shared.load().rescan_delays.clone();
        let message = match queue.next_deadline(&delays) {
            Some(deadline) => receiver.recv_deadline(deadline),
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match message {
            Ok(source) => {
                log::debug!("Scheduling rescan after edit of {}", source.display());
                queue.schedule(source, Instant::now());
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let snapshot = shared.load();
        for probe in queue.due(Instant::now(), &delays) {
            let artifacts = find_fresh_artifacts(&snapshot, &probe.source, probe.since);
            if artifacts.is_empty() {
                if probe.last {
                    log::debug!("No fresh classes for {}", probe.source.display());
                }
                continue;
            }

            queue.finish(&probe.source);
            events.emit(DeployEvent::RescanMatched {
                source: probe.source.display().to_string(),
                artifacts: artifacts.len(),
            });
            for artifact in artifacts {
                if compiled.send(FsEvent::new(artifact, FsEventKind::Change)).is_err() {
                    return;
                }
            }
        }
    }
    log::debug!("Rescan channel stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ManualWatchSource;
    use crate::test_support::{snapshot, wait_for};
    use smartdeploy_config::ConfigError;
    use smartdeploy_events::RecordingEvents;
    use smartdeploy_mapping::{CompiledMapping, Mapping, MappingOrigin};
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn started(root: &Path, reloader: Option<Box<dyn Reload>>) -> (SchedulerHandle, ManualWatchSource, Arc<RecordingEvents>) {
        let source = ManualWatchSource::new();
        let events = Arc::new(RecordingEvents::new());
        let handle = start(
            source.clone(),
            snapshot(root),
            reloader,
            Arc::clone(&events) as Arc<dyn DeployEvents>,
        )
        .unwrap();
        (handle, source, events)
    }

    #[test]
    fn test_static_channel_deploys_immediately() {
        let dir = TempDir::new().unwrap();
        let jsp = dir.path().join("src/main/webapp/pages/index.jsp");
        write(&jsp, "page");
        let (handle, source, _events) = started(dir.path(), None);

        source.push(&jsp, FsEventKind::Change);

        let deployed = dir.path().join("deploy/pages/index.jsp");
        assert!(wait_for(|| deployed.is_file()));
        handle.stop();
        assert_eq!(fs::read_to_string(deployed).unwrap(), "page");
    }

    #[test]
    fn test_compiled_burst_becomes_one_batch() {
        let dir = TempDir::new().unwrap();
        let classes = dir.path().join("target/classes/com/example");
        for name in ["Foo.class", "Foo$1.class", "Bar.class"] {
            write(&classes.join(name), name);
        }
        let (handle, source, events) = started(dir.path(), None);

        for name in ["Foo.class", "Foo$1.class", "Bar.class"] {
            source.push(classes.join(name), FsEventKind::Create);
        }

        assert!(wait_for(|| {
            events.count(|e| matches!(e, DeployEvent::BatchExecuted { .. })) > 0
        }));
        std::thread::sleep(Duration::from_millis(150));
        handle.stop();

        assert_eq!(
            events.count(|e| matches!(e, DeployEvent::BatchExecuted { .. })),
            1
        );
        assert_eq!(
            events.count(|e| *e == DeployEvent::BatchExecuted { files: 3 }),
            1
        );
        assert_eq!(
            events.count(|e| matches!(e, DeployEvent::ReloadRequested { .. })),
            1
        );
        assert!(
            dir.path()
                .join("deploy/WEB-INF/classes/com/example/Foo$1.class")
                .is_file()
        );
    }

    #[test]
    fn test_source_edit_rescans_output_root() {
        let dir = TempDir::new().unwrap();
        let java = dir.path().join("src/main/java/com/example/Foo.java");
        write(&java, "class Foo {}");
        write(
            &dir.path().join("target/classes/com/example/Foo.class"),
            "bytecode",
        );
        let (handle, source, events) = started(dir.path(), None);

        source.push(&java, FsEventKind::Change);

        let deployed = dir.path().join("deploy/WEB-INF/classes/com/example/Foo.class");
        assert!(wait_for(|| deployed.is_file()));
        handle.stop();
        assert_eq!(
            events.count(|e| matches!(e, DeployEvent::RescanMatched { artifacts: 1, .. })),
            1
        );
    }

    #[test]
    fn test_config_change_swaps_snapshot() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let reloader = move || -> Result<WatchSnapshot, ConfigError> {
            let mut next = snapshot(&root);
            next.mappings.insert(
                0,
                CompiledMapping::new(Mapping::new(
                    "conf/**/*",
                    "WEB-INF/classes/conf/{relative}",
                    MappingOrigin::Local,
                )),
            );
            Ok(next)
        };
        let (handle, source, events) = started(dir.path(), Some(Box::new(reloader)));
        let before = handle.snapshot().mappings.len();

        source.push(dir.path().join(".smartdeploy/mappings.json"), FsEventKind::Change);

        assert!(wait_for(|| {
            events.count(|e| matches!(e, DeployEvent::ConfigReloaded { .. })) == 1
        }));
        assert_eq!(handle.snapshot().mappings.len(), before + 1);

        let conf = dir.path().join("conf/app.properties");
        write(&conf, "a=1");
        source.push(&conf, FsEventKind::Create);
        let deployed = dir.path().join("deploy/WEB-INF/classes/conf/app.properties");
        assert!(wait_for(|| deployed.is_file()));
        handle.stop();
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let settings = dir.path().join("smartdeploy.toml");
        let failing = {
            let settings = settings.clone();
            move || -> Result<WatchSnapshot, ConfigError> {
                Err(ConfigError::InvalidSetting {
                    path: settings.clone(),
                    key: "debounceMs",
                    message: "bad".to_string(),
                })
            }
        };
        let (handle, source, events) = started(dir.path(), Some(Box::new(failing)));
        let before = handle.snapshot().mappings.len();

        source.push(&settings, FsEventKind::Change);

        assert!(wait_for(|| {
            events.count(|e| matches!(e, DeployEvent::ConfigReloadFailed { .. })) == 1
        }));
        assert_eq!(handle.snapshot().mappings.len(), before);
        handle.stop();
    }
}
