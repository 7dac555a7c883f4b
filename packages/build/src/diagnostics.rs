//! Failure diagnostics from compiler and build tool output.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::collections::HashSet;

use crate::error::BuildError;
use crate::runner::{CommandOutput, CommandSpec};
use crate::strategy::BuildStrategy;

/// Lines that every failing Maven run prints.
const MAVEN_NOISE: &[&str] = &[
    "-> [Help 1]",
    "[Help 1]",
    "Re-run Maven",
    "To see the full stack trace",
    "For more information about the errors",
    "After correcting the problems",
    "mvn <args> -rf",
];

const GRADLE_NOISE: &[&str] = &[
    "* Try:",
    "> Run with --stacktrace",
    "> Run with --info",
    "> Run with --debug",
    "> Run with --scan",
    "> Get more help at",
    "Get more help at https://help.gradle.org",
    "BUILD FAILED in",
];

/// Output fragments that mean a file is locked by another process.
const BUSY_MARKERS: &[&str] = &[
    "resource busy",
    "text file busy",
    "being used by another process",
    "sharing violation",
    "lock violation",
];

/// How many trailing lines are kept when nothing looks like an error.
const TAIL_LINES: usize = 20;

fn is_noise(line: &str, noise: &[&str]) -> bool {
    noise.iter().any(|n| line.contains(n))
}

/// Pull failure lines out of a tool's combined output.
///
/// * Maven: `[ERROR]` lines without the prefix
/// * Gradle: `e:` and `error:` lines plus the "What went wrong" block
/// * javac: `error:` lines and the error count
///
/// Lines are de-duplicated in first-seen order. When nothing matches, the
/// last few non-empty lines are returned instead.
#[must_use]
pub fn extract_diagnostics(strategy: BuildStrategy, output: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut in_what_went_wrong = false;

    for raw in output.lines() {
        let line = raw.trim_end();
        let trimmed = line.trim();

        match strategy {
            BuildStrategy::Maven => {
                if let Some(rest) = trimmed.strip_prefix("[ERROR]") {
                    let rest = rest.trim();
                    if !rest.is_empty() && !is_noise(rest, MAVEN_NOISE) {
                        lines.push(rest.to_string());
                    }
                }
            }
            BuildStrategy::Gradle => {
                if trimmed == "* What went wrong:" {
                    in_what_went_wrong = true;
                    continue;
                }
                if in_what_went_wrong {
                    if trimmed.is_empty() || trimmed.starts_with('*') {
                        in_what_went_wrong = false;
                    } else if !is_noise(trimmed, GRADLE_NOISE) {
                        lines.push(trimmed.to_string());
                    }
                    continue;
                }
                if trimmed.starts_with("e: ") || trimmed.contains("error:") {
                    lines.push(trimmed.to_string());
                }
            }
            BuildStrategy::Local => {
                let is_count = trimmed.ends_with(" error") || trimmed.ends_with(" errors");
                if trimmed.contains("error:") || (is_count && trimmed.starts_with(char::is_numeric))
                {
                    lines.push(trimmed.to_string());
                }
            }
        }
    }

    let mut seen = HashSet::new();
    lines.retain(|line| seen.insert(line.clone()));

    if lines.is_empty() {
        let tail: Vec<&str> = output
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();
        let start = tail.len().saturating_sub(TAIL_LINES);
        lines = tail[start..].iter().map(|l| (*l).to_string()).collect();
    }

    lines
}

/// Whether tool output reports a locked file.
#[must_use]
pub fn mentions_busy_resource(output: &str) -> bool {
    let lower = output.to_lowercase();
    BUSY_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Turn an unsuccessful command into the matching error.
///
/// # Errors
///
/// * [`BuildError::ResourceBusy`] if the output reports a locked file
/// * [`BuildError::ToolFailed`] for any other failure
pub(crate) fn check_output(
    strategy: BuildStrategy,
    spec: &CommandSpec,
    output: &CommandOutput,
) -> Result<(), BuildError> {
    if output.success {
        return Ok(());
    }

    let text = output.combined();
    let diagnostics = extract_diagnostics(strategy, &text);
    if mentions_busy_resource(&text) {
        return Err(BuildError::ResourceBusy {
            message: diagnostics.join("; "),
        });
    }
    Err(BuildError::ToolFailed {
        command: spec.to_string(),
        status: output.status.clone(),
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maven_errors_without_noise() {
        let output = "\
[INFO] Compiling 3 source files
[ERROR] /app/src/main/java/Foo.java:[3,8] cannot find symbol
[ERROR] /app/src/main/java/Foo.java:[3,8] cannot find symbol
[ERROR] Failed to execute goal compile
[ERROR] -> [Help 1]
[ERROR] 
[ERROR] Re-run Maven using the -X switch to enable full debug logging.
";
        assert_eq!(
            extract_diagnostics(BuildStrategy::Maven, output),
            vec![
                "/app/src/main/java/Foo.java:[3,8] cannot find symbol",
                "Failed to execute goal compile",
            ]
        );
    }

    #[test]
    fn test_gradle_what_went_wrong_block() {
        let output = "\
> Task :compileJava FAILED
/app/src/main/java/Foo.java:3: error: ';' expected

FAILURE: Build failed with an exception.

* What went wrong:
Execution failed for task ':compileJava'.
> Compilation failed; see the compiler error output for details.

* Try:
> Run with --stacktrace option to get the stack trace.
";
        assert_eq!(
            extract_diagnostics(BuildStrategy::Gradle, output),
            vec![
                "/app/src/main/java/Foo.java:3: error: ';' expected",
                "Execution failed for task ':compileJava'.",
                "> Compilation failed; see the compiler error output for details.",
            ]
        );
    }

    #[test]
    fn test_javac_errors_and_count() {
        let output = "\
src/Foo.java:3: error: cannot find symbol
    Bar b;
    ^
1 error
";
        assert_eq!(
            extract_diagnostics(BuildStrategy::Local, output),
            vec!["src/Foo.java:3: error: cannot find symbol", "1 error"]
        );
    }

    #[test]
    fn test_unrecognized_output_keeps_tail() {
        let output = "something\n\nwent sideways\n";
        assert_eq!(
            extract_diagnostics(BuildStrategy::Maven, output),
            vec!["something", "went sideways"]
        );
    }

    #[test]
    fn test_busy_markers() {
        assert!(mentions_busy_resource(
            "java.nio.file.FileSystemException: app.jar: The process cannot access the file \
             because it is being used by another process"
        ));
        assert!(mentions_busy_resource("Sharing violation on WEB-INF/lib/app.jar"));
        assert!(mentions_busy_resource("cp: cannot create regular file 'app': Text file busy"));
        assert!(!mentions_busy_resource("BUILD SUCCESS"));
    }

    #[test]
    fn test_permission_failures_are_not_busy() {
        assert!(!mentions_busy_resource("Failed to delete target/app.war"));
        assert!(!mentions_busy_resource(
            "java.nio.file.AccessDeniedException: target/app.war: Access is denied"
        ));
    }
}
