//! Runs one build at a time with bounded retries on locked files.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use smartdeploy_config::DeployConfig;
use smartdeploy_copy::count_files;
use smartdeploy_events::{DeployEvent, DeployEvents};

use crate::collaborators::{ProcessTerminator, ServerController};
use crate::delegate::build_delegated;
use crate::error::BuildError;
use crate::local::build_local;
use crate::runner::CommandRunner;
use crate::strategy::{BuildStrategy, Platform};

/// Attempts made before a resource-busy failure becomes terminal.
pub const MAX_ATTEMPTS: u32 = 3;

/// Result of a build trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The target holds a fresh deployment.
    Deployed {
        /// The deploy target.
        target: PathBuf,
        /// Files found in the target afterwards.
        files: u64,
        /// Attempts it took, 1-based.
        attempts: u32,
    },
    /// Another build was already running; nothing was done.
    Ignored,
}

/// Clears the busy flag when the build finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Build pipeline executor.
pub struct BuildExecutor {
    busy: AtomicBool,
    platform: Platform,
    javac: Option<PathBuf>,
    runner: Arc<dyn CommandRunner>,
    terminator: Arc<dyn ProcessTerminator>,
    server: Arc<dyn ServerController>,
    events: Arc<dyn DeployEvents>,
}

impl BuildExecutor {
    /// Create an executor for the current platform.
    #[must_use]
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        terminator: Arc<dyn ProcessTerminator>,
        server: Arc<dyn ServerController>,
        events: Arc<dyn DeployEvents>,
    ) -> Self {
        Self {
            busy: AtomicBool::new(false),
            platform: Platform::current(),
            javac: None,
            runner,
            terminator,
            server,
            events,
        }
    }

    /// Override the host platform.
    #[must_use]
    pub const fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Use a specific compiler instead of looking one up.
    #[must_use]
    pub fn with_javac(mut self, javac: impl Into<PathBuf>) -> Self {
        self.javac = Some(javac.into());
        self
    }

    /// Whether a build is currently running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Build into the configured deploy target.
    ///
    /// # Errors
    ///
    /// * If no deploy target is configured
    /// * If the build fails (see [`Self::execute_into`])
    pub fn execute(
        &self,
        config: &DeployConfig,
        strategy: BuildStrategy,
    ) -> Result<BuildOutcome, BuildError> {
        let Some(target) = config.deploy_target() else {
            let err = BuildError::NoDeployTarget;
            self.events.emit(DeployEvent::BuildFailed {
                diagnostics: err.diagnostics(),
            });
            return Err(err);
        };
        self.execute_into(config, strategy, &target)
    }

    /// Build into `target`.
    ///
    /// A trigger that arrives while another build runs is ignored.
    ///
    /// # Arguments
    ///
    /// * `config` - Project configuration
    /// * `strategy` - How to produce the webapp
    /// * `target` - Deployed webapp directory
    ///
    /// # Errors
    ///
    /// * If the server cannot be stopped
    /// * If the tool fails, or keeps hitting locked files for
    ///   [`MAX_ATTEMPTS`] attempts
    /// * If the target is empty afterwards
    pub fn execute_into(
        &self,
        config: &DeployConfig,
        strategy: BuildStrategy,
        target: &Path,
    ) -> Result<BuildOutcome, BuildError> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            self.events.emit(DeployEvent::BuildIgnored {
                strategy: strategy.to_string(),
            });
            return Ok(BuildOutcome::Ignored);
        };

        self.events.emit(DeployEvent::BuildStarted {
            strategy: strategy.to_string(),
        });

        match self.run(config, strategy, target) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.events.emit(DeployEvent::BuildFailed {
                    diagnostics: e.diagnostics(),
                });
                Err(e)
            }
        }
    }

    fn run(
        &self,
        config: &DeployConfig,
        strategy: BuildStrategy,
        target: &Path,
    ) -> Result<BuildOutcome, BuildError> {
        self.server.ensure_stopped()?;

        let attempts = self.run_with_retries(config, strategy, target)?;

        let files = count_files(target);
        if files == 0 {
            return Err(BuildError::ArtifactNotConfirmed {
                target: target.to_path_buf(),
            });
        }

        self.server.notify_deployed(target);
        self.server.reload();
        self.events.emit(DeployEvent::BuildSucceeded {
            artifact: target.display().to_string(),
        });
        self.events.emit(DeployEvent::ReloadRequested {
            reason: format!("{strategy} build"),
        });

        Ok(BuildOutcome::Deployed {
            target: target.to_path_buf(),
            files,
            attempts,
        })
    }

    fn run_with_retries(
        &self,
        config: &DeployConfig,
        strategy: BuildStrategy,
        target: &Path,
    ) -> Result<u32, BuildError> {
        let mut attempt = 1;
        loop {
            match self.run_once(config, strategy, target) {
                Ok(()) => return Ok(attempt),
                Err(e) if e.is_resource_busy() && attempt < MAX_ATTEMPTS => {
                    log::warn!("Attempt {attempt} hit a locked file: {e}");
                    self.events.emit(DeployEvent::BuildRetry {
                        attempt,
                        reason: e.to_string(),
                    });
                    self.terminator.terminate_lock_holders();
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn run_once(
        &self,
        config: &DeployConfig,
        strategy: BuildStrategy,
        target: &Path,
    ) -> Result<(), BuildError> {
        match strategy {
            BuildStrategy::Local => build_local(
                config,
                target,
                self.javac.as_deref(),
                self.runner.as_ref(),
                self.platform,
            ),
            BuildStrategy::Maven | BuildStrategy::Gradle => {
                build_delegated(strategy, config, target, self.runner.as_ref(), self.platform)
                    .map(|_| ())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::DetachedServer;
    use crate::runner::{CommandOutput, CommandSpec};
    use smartdeploy_config::{DEFAULT_MAPPING_FILE, SETTINGS_FILE, Settings};
    use smartdeploy_events::RecordingEvents;
    use smartdeploy_layout::{LayoutKind, ProjectLayout};
    use std::collections::VecDeque;
    use std::fs;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(root: &Path, kind: LayoutKind) -> DeployConfig {
        let layout = ProjectLayout {
            kind,
            root: root.to_path_buf(),
            compiled_output_root: PathBuf::from("target/classes"),
            source_roots: vec![PathBuf::from("src/main/java")],
            resource_roots: vec![PathBuf::from("src/main/resources")],
            web_resource_roots: vec![PathBuf::from("src/main/webapp")],
            artifact_name: "shop".to_string(),
            descriptor: None,
        };
        let settings = Settings {
            deploy_dir: Some(PathBuf::from("deploy")),
            ..Settings::default()
        };
        DeployConfig::from_parts(
            layout,
            settings,
            Vec::new(),
            root.join(DEFAULT_MAPPING_FILE),
            root.join(SETTINGS_FILE),
        )
    }

    fn maven_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("mvnw"), "#!/bin/sh").unwrap();
        fs::write(dir.path().join("mvnw.cmd"), "@echo off").unwrap();
        dir
    }

    fn output(success: bool, stdout: &str) -> CommandOutput {
        CommandOutput {
            success,
            status: if success { "exit status: 0" } else { "exit status: 1" }.to_string(),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn busy() -> CommandOutput {
        output(
            false,
            "[ERROR] Failed to delete target/shop/WEB-INF/lib/app.jar: being used by another process",
        )
    }

    /// Replays scripted outputs; a successful run leaves an exploded webapp.
    struct ScriptedRunner {
        outputs: Mutex<VecDeque<CommandOutput>>,
        calls: AtomicUsize,
    }

    impl ScriptedRunner {
        fn new(outputs: Vec<CommandOutput>) -> Self {
            Self {
                outputs: Mutex::new(outputs.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, spec: &CommandSpec, _timeout: Duration) -> Result<CommandOutput, BuildError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .outputs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| output(true, "BUILD SUCCESS"));
            if next.success {
                let exploded = spec.cwd.join("target/shop");
                fs::create_dir_all(&exploded).unwrap();
                fs::write(exploded.join("index.jsp"), "<html/>").unwrap();
            }
            Ok(next)
        }
    }

    #[derive(Default)]
    struct CountingTerminator {
        calls: AtomicUsize,
    }

    impl ProcessTerminator for CountingTerminator {
        fn terminate_lock_holders(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        executor: BuildExecutor,
        runner: Arc<ScriptedRunner>,
        terminator: Arc<CountingTerminator>,
        events: Arc<RecordingEvents>,
    }

    fn harness(outputs: Vec<CommandOutput>) -> Harness {
        let runner = Arc::new(ScriptedRunner::new(outputs));
        let terminator = Arc::new(CountingTerminator::default());
        let events = Arc::new(RecordingEvents::new());
        let executor = BuildExecutor::new(
            runner.clone(),
            terminator.clone(),
            Arc::new(DetachedServer),
            events.clone(),
        )
        .with_platform(Platform::Unix);
        Harness {
            executor,
            runner,
            terminator,
            events,
        }
    }

    #[test]
    fn test_busy_failures_retry_until_success() {
        let project = maven_project();
        let config = config(project.path(), LayoutKind::Maven);
        let h = harness(vec![busy(), busy()]);

        let outcome = h.executor.execute(&config, BuildStrategy::Maven).unwrap();

        let BuildOutcome::Deployed { files, attempts, target } = outcome else {
            panic!("build was ignored");
        };
        assert_eq!(attempts, 3);
        assert_eq!(files, 1);
        assert_eq!(target, project.path().join("deploy"));
        assert!(target.join("index.jsp").is_file());
        assert_eq!(h.terminator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            h.events.count(|e| matches!(e, DeployEvent::BuildRetry { .. })),
            2
        );
        assert_eq!(
            h.events.count(|e| matches!(e, DeployEvent::ReloadRequested { .. })),
            1
        );
        assert!(!h.executor.is_busy());
    }

    #[test]
    fn test_tool_failure_is_terminal() {
        let project = maven_project();
        let config = config(project.path(), LayoutKind::Maven);
        let h = harness(vec![output(
            false,
            "[ERROR] /src/Foo.java:[3,1] cannot find symbol\n[ERROR] BUILD FAILURE",
        )]);

        let err = h.executor.execute(&config, BuildStrategy::Maven).unwrap_err();

        assert!(matches!(err, BuildError::ToolFailed { .. }));
        assert_eq!(h.runner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.terminator.calls.load(Ordering::SeqCst), 0);
        let failures: Vec<_> = h
            .events
            .events()
            .into_iter()
            .filter_map(|e| match e {
                DeployEvent::BuildFailed { diagnostics } => Some(diagnostics),
                _ => None,
            })
            .collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].iter().any(|line| line.contains("cannot find symbol")));
    }

    #[test]
    fn test_permission_failure_is_not_retried() {
        let project = maven_project();
        let config = config(project.path(), LayoutKind::Maven);
        let h = harness(vec![output(
            false,
            "[ERROR] Failed to delete target/shop.war: Access is denied",
        )]);

        let err = h.executor.execute(&config, BuildStrategy::Maven).unwrap_err();

        assert!(matches!(err, BuildError::ToolFailed { .. }));
        assert_eq!(h.runner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.terminator.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_busy_failures_exhaust_attempts() {
        let project = maven_project();
        let config = config(project.path(), LayoutKind::Maven);
        let h = harness(vec![busy(), busy(), busy()]);

        let err = h.executor.execute(&config, BuildStrategy::Maven).unwrap_err();

        assert!(err.is_resource_busy());
        assert_eq!(h.runner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(h.terminator.calls.load(Ordering::SeqCst), 2);
        assert!(!h.executor.is_busy());
    }

    #[test]
    fn test_missing_deploy_target() {
        let project = maven_project();
        let mut config = config(project.path(), LayoutKind::Maven);
        config.settings.deploy_dir = None;
        let h = harness(Vec::new());

        let err = h.executor.execute(&config, BuildStrategy::Maven).unwrap_err();

        assert!(matches!(err, BuildError::NoDeployTarget));
        assert_eq!(h.runner.calls.load(Ordering::SeqCst), 0);
    }

    /// Blocks inside the tool until released.
    struct BlockingRunner {
        started: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl CommandRunner for BlockingRunner {
        fn run(&self, spec: &CommandSpec, _timeout: Duration) -> Result<CommandOutput, BuildError> {
            self.started.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            let exploded = spec.cwd.join("target/shop");
            fs::create_dir_all(&exploded).unwrap();
            fs::write(exploded.join("index.jsp"), "<html/>").unwrap();
            Ok(output(true, "BUILD SUCCESS"))
        }
    }

    #[test]
    fn test_concurrent_trigger_is_ignored() {
        let project = maven_project();
        let config = Arc::new(config(project.path(), LayoutKind::Maven));
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let events = Arc::new(RecordingEvents::new());
        let executor = Arc::new(
            BuildExecutor::new(
                Arc::new(BlockingRunner {
                    started: Mutex::new(started_tx),
                    release: Mutex::new(release_rx),
                }),
                Arc::new(CountingTerminator::default()),
                Arc::new(DetachedServer),
                events.clone(),
            )
            .with_platform(Platform::Unix),
        );

        let first = {
            let executor = executor.clone();
            let config = config.clone();
            std::thread::spawn(move || executor.execute(&config, BuildStrategy::Maven))
        };
        started_rx.recv().unwrap();
        assert!(executor.is_busy());

        let second = executor.execute(&config, BuildStrategy::Maven).unwrap();
        assert_eq!(second, BuildOutcome::Ignored);

        release_tx.send(()).unwrap();
        let first = first.join().unwrap().unwrap();
        assert!(matches!(first, BuildOutcome::Deployed { attempts: 1, .. }));
        assert_eq!(
            events.count(|e| matches!(e, DeployEvent::BuildIgnored { .. })),
            1
        );
        assert_eq!(
            events.count(|e| matches!(e, DeployEvent::BuildStarted { .. })),
            1
        );
    }

    /// Stands in for `javac`: writes a class file for every source listed
    /// in the argument file.
    struct FakeJavac;

    impl CommandRunner for FakeJavac {
        fn run(&self, spec: &CommandSpec, _timeout: Duration) -> Result<CommandOutput, BuildError> {
            let classes = spec
                .args
                .iter()
                .position(|a| a == "-d")
                .map(|i| PathBuf::from(&spec.args[i + 1]))
                .unwrap();
            let arg_file = spec.args.last().unwrap().trim_start_matches('@');
            for line in fs::read_to_string(arg_file).unwrap().lines() {
                let source = PathBuf::from(line.trim_matches('"'));
                let class = source.file_stem().unwrap().to_string_lossy().to_string();
                let package = classes.join("com/example");
                fs::create_dir_all(&package).unwrap();
                fs::write(package.join(format!("{class}.class")), "cafebabe").unwrap();
            }
            Ok(output(true, ""))
        }
    }

    #[test]
    fn test_local_strategy_end_to_end() {
        let project = TempDir::new().unwrap();
        let root = project.path();
        let java = root.join("src/main/java/com/example");
        fs::create_dir_all(&java).unwrap();
        fs::write(java.join("Foo.java"), "package com.example; class Foo {}").unwrap();
        let webapp = root.join("src/main/webapp");
        fs::create_dir_all(&webapp).unwrap();
        fs::write(webapp.join("index.jsp"), "<html/>").unwrap();
        let resources = root.join("src/main/resources");
        fs::create_dir_all(&resources).unwrap();
        fs::write(resources.join("app.properties"), "a=1").unwrap();
        let deploy = root.join("deploy");
        fs::create_dir_all(&deploy).unwrap();
        fs::write(deploy.join("stale.jsp"), "old").unwrap();

        let config = config(root, LayoutKind::Maven);
        let events = Arc::new(RecordingEvents::new());
        let executor = BuildExecutor::new(
            Arc::new(FakeJavac),
            Arc::new(CountingTerminator::default()),
            Arc::new(DetachedServer),
            events.clone(),
        )
        .with_platform(Platform::Unix)
        .with_javac("javac");

        let outcome = executor.execute(&config, BuildStrategy::Local).unwrap();

        assert!(matches!(outcome, BuildOutcome::Deployed { attempts: 1, .. }));
        assert!(deploy.join("index.jsp").is_file());
        assert!(!deploy.join("stale.jsp").exists());
        assert!(deploy.join("WEB-INF/classes/app.properties").is_file());
        assert!(deploy.join("WEB-INF/classes/com/example/Foo.class").is_file());
        assert_eq!(
            events.count(|e| matches!(e, DeployEvent::BuildSucceeded { .. })),
            1
        );
    }
}
