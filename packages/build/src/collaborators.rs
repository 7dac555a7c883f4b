//! External collaborators of the executor.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::BuildError;
use crate::runner::{CommandRunner, CommandSpec};
use crate::strategy::Platform;

const TERMINATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Kills processes that may hold locks on deployed files.
pub trait ProcessTerminator: Send + Sync {
    /// Forcibly terminate possible lock holders. Best effort.
    fn terminate_lock_holders(&self);
}

/// Terminates processes whose command line matches a pattern.
pub struct PatternTerminator {
    platform: Platform,
    pattern: String,
    cwd: PathBuf,
    runner: Arc<dyn CommandRunner>,
}

impl PatternTerminator {
    /// Create a terminator for `pattern` using the platform kill command.
    #[must_use]
    pub fn new(platform: Platform, pattern: &str, cwd: &Path, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            platform,
            pattern: pattern.to_string(),
            cwd: cwd.to_path_buf(),
            runner,
        }
    }
}

impl ProcessTerminator for PatternTerminator {
    fn terminate_lock_holders(&self) {
        if self.pattern.trim().is_empty() {
            log::debug!("No lock holder pattern configured");
            return;
        }

        let (program, args) = self.platform.terminate_command(&self.pattern);
        let spec = CommandSpec::new(program, args, &self.cwd);
        match self.runner.run(&spec, TERMINATE_TIMEOUT) {
            // pkill exits 1 when nothing matched.
            Ok(output) => log::info!("Terminated lock holders ({})", output.status),
            Err(e) => log::warn!("Could not terminate lock holders: {e}"),
        }
    }
}

impl std::fmt::Debug for PatternTerminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternTerminator")
            .field("platform", &self.platform)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

/// The running application server.
///
/// The engine asks for the server to be stopped before a full build and
/// reports the deployed directory afterwards; the server's own lifecycle
/// is managed elsewhere.
pub trait ServerController: Send + Sync {
    /// Make sure the server is not holding the target.
    ///
    /// # Errors
    ///
    /// * If the server could not be stopped
    fn ensure_stopped(&self) -> Result<(), BuildError>;

    /// The target now holds a fresh deployment.
    fn notify_deployed(&self, artifact: &Path);

    /// Ask the server to reload the application.
    fn reload(&self);
}

/// Controller for setups without a managed server.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedServer;

impl ServerController for DetachedServer {
    fn ensure_stopped(&self) -> Result<(), BuildError> {
        Ok(())
    }

    fn notify_deployed(&self, artifact: &Path) {
        log::info!("Deployed {}", artifact.display());
    }

    fn reload(&self) {
        log::debug!("No server to reload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        specs: Mutex<Vec<CommandSpec>>,
    }

    impl CommandRunner for Recorder {
        fn run(&self, spec: &CommandSpec, _timeout: Duration) -> Result<CommandOutput, BuildError> {
            self.specs.lock().unwrap().push(spec.clone());
            Ok(CommandOutput {
                success: false,
                status: "exit status: 1".to_string(),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    #[test]
    fn test_pattern_terminator_runs_kill_command() {
        let recorder = Arc::new(Recorder::default());
        let terminator = PatternTerminator::new(
            Platform::Unix,
            "org.apache.catalina.startup.Bootstrap",
            Path::new("/tmp"),
            Arc::clone(&recorder) as Arc<dyn CommandRunner>,
        );

        terminator.terminate_lock_holders();

        let specs = recorder.specs.lock().unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(
            specs[0].to_string(),
            "pkill -f org.apache.catalina.startup.Bootstrap"
        );
    }

    #[test]
    fn test_pattern_terminator_skips_empty_pattern() {
        let recorder = Arc::new(Recorder::default());
        let terminator = PatternTerminator::new(
            Platform::Unix,
            " ",
            Path::new("/tmp"),
            Arc::clone(&recorder) as Arc<dyn CommandRunner>,
        );

        terminator.terminate_lock_holders();

        assert!(recorder.specs.lock().unwrap().is_empty());
    }
}
