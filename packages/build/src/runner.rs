//! Running external commands.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::BuildError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable.
    pub program: PathBuf,
    /// Arguments.
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: PathBuf,
}

impl CommandSpec {
    /// Create a command.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: cwd.to_path_buf(),
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited successfully.
    pub success: bool,
    /// Exit status description.
    pub status: String,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Standard output followed by standard error.
    #[must_use]
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            return self.stdout.clone();
        }
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Runs external commands to completion.
pub trait CommandRunner: Send + Sync {
    /// Run `spec`, killing it once `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// * If the command cannot be started
    /// * If the command times out
    fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput, BuildError>;
}

/// Runs commands as child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

fn drain<R>(pipe: Option<R>) -> thread::JoinHandle<String>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput, BuildError> {
        log::info!("Running {spec}");
        let command = spec.to_string();

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BuildError::SpawnError {
                command: command.clone(),
                source,
            })?;

        // Read both pipes concurrently so a chatty tool cannot fill one and block.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= timeout => {
                    log::warn!("{command} timed out, killing it");
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(BuildError::Timeout { command, timeout });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => return Err(BuildError::SpawnError { command, source }),
            }
        };

        let output = CommandOutput {
            success: status.success(),
            status: status.to_string(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        };
        log::debug!("{command} finished: {}", output.status);
        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str, cwd: &Path) -> CommandSpec {
        CommandSpec::new("sh", vec!["-c".to_string(), script.to_string()], cwd)
    }

    #[test]
    fn test_system_runner_captures_output() {
        let dir = TempDir::new().unwrap();

        let output = SystemRunner
            .run(&sh("echo out; echo err >&2; exit 3", dir.path()), Duration::from_secs(10))
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert!(output.combined().contains("out\n"));
    }

    #[test]
    fn test_system_runner_times_out() {
        let dir = TempDir::new().unwrap();

        let err = SystemRunner
            .run(&sh("sleep 5", dir.path()), Duration::from_millis(100))
            .unwrap_err();

        assert!(matches!(err, BuildError::Timeout { .. }));
    }

    #[test]
    fn test_system_runner_missing_program() {
        let dir = TempDir::new().unwrap();
        let spec = CommandSpec::new("/nonexistent/tool", Vec::new(), dir.path());

        let err = SystemRunner.run(&spec, Duration::from_secs(1)).unwrap_err();

        assert!(matches!(err, BuildError::SpawnError { .. }));
    }
}
