//! Build strategies and per-platform command tables.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use smartdeploy_config::StrategyPreference;
use smartdeploy_layout::LayoutKind;

/// How a full deploy produces the webapp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
    /// Sync web roots, compile with `javac`, apply local mappings.
    Local,
    /// Run Maven and deploy its archive.
    Maven,
    /// Run Gradle and deploy its archive.
    Gradle,
}

impl BuildStrategy {
    /// Pick the strategy for a preference and a detected layout.
    ///
    /// `auto` delegates to the project's own build tool and falls back to
    /// `local` for Eclipse and plain projects.
    #[must_use]
    pub const fn select(preference: StrategyPreference, kind: LayoutKind) -> Self {
        match (preference, kind) {
            (StrategyPreference::Local, _)
            | (StrategyPreference::Auto, LayoutKind::Eclipse | LayoutKind::Plain) => Self::Local,
            (StrategyPreference::Maven, _) | (StrategyPreference::Auto, LayoutKind::Maven) => {
                Self::Maven
            }
            (StrategyPreference::Gradle, _) | (StrategyPreference::Auto, LayoutKind::Gradle) => {
                Self::Gradle
            }
        }
    }

    /// Arguments passed to the delegated build tool.
    #[must_use]
    pub const fn tool_args(self) -> &'static [&'static str] {
        match self {
            Self::Local => &[],
            Self::Maven => &["-B", "package", "-DskipTests"],
            Self::Gradle => &["war", "-x", "test", "--console=plain"],
        }
    }

    /// Glob patterns, relative to the project root, where the archive lands.
    #[must_use]
    pub const fn archive_globs(self) -> &'static [&'static str] {
        match self {
            Self::Local => &[],
            Self::Maven => &["target/*.war"],
            Self::Gradle => &["build/libs/*.war"],
        }
    }

    /// Exploded webapp directory left by the tool, relative to the root.
    #[must_use]
    pub fn exploded_dir(self, artifact_name: &str) -> Option<PathBuf> {
        match self {
            Self::Local => None,
            Self::Maven => Some(PathBuf::from("target").join(artifact_name)),
            Self::Gradle => Some(PathBuf::from("build/exploded").join(artifact_name)),
        }
    }
}

impl std::fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Maven => write!(f, "maven"),
            Self::Gradle => write!(f, "gradle"),
        }
    }
}

/// Host platform, for executable names and process termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux, macOS and other Unix-likes.
    Unix,
    /// Windows.
    Windows,
}

impl Platform {
    /// The platform this binary runs on.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Unix }
    }

    /// Project wrapper script for a delegated strategy.
    #[must_use]
    pub const fn wrapper_script(self, strategy: BuildStrategy) -> Option<&'static str> {
        match (self, strategy) {
            (_, BuildStrategy::Local) => None,
            (Self::Unix, BuildStrategy::Maven) => Some("mvnw"),
            (Self::Windows, BuildStrategy::Maven) => Some("mvnw.cmd"),
            (Self::Unix, BuildStrategy::Gradle) => Some("gradlew"),
            (Self::Windows, BuildStrategy::Gradle) => Some("gradlew.bat"),
        }
    }

    /// Build tool looked up on `PATH` when there is no wrapper.
    #[must_use]
    pub const fn tool_name(self, strategy: BuildStrategy) -> &'static str {
        match (self, strategy) {
            (Self::Unix, BuildStrategy::Local) => "javac",
            (Self::Windows, BuildStrategy::Local) => "javac.exe",
            (Self::Unix, BuildStrategy::Maven) => "mvn",
            (Self::Windows, BuildStrategy::Maven) => "mvn.cmd",
            (Self::Unix, BuildStrategy::Gradle) => "gradle",
            (Self::Windows, BuildStrategy::Gradle) => "gradle.bat",
        }
    }

    /// Separator between classpath entries.
    #[must_use]
    pub const fn classpath_separator(self) -> &'static str {
        match self {
            Self::Unix => ":",
            Self::Windows => ";",
        }
    }

    /// Command that kills every process whose command line contains
    /// `pattern`.
    #[must_use]
    pub fn terminate_command(self, pattern: &str) -> (&'static str, Vec<String>) {
        match self {
            Self::Unix => ("pkill", vec!["-f".to_string(), pattern.to_string()]),
            Self::Windows => (
                "powershell",
                vec![
                    "-NoProfile".to_string(),
                    "-Command".to_string(),
                    format!(
                        "Get-CimInstance Win32_Process | Where-Object {{ $_.CommandLine -like '*{pattern}*' }} | ForEach-Object {{ Stop-Process -Id $_.ProcessId -Force }}"
                    ),
                ],
            ),
        }
    }
}
