//! Configuration types for smartdeploy.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smartdeploy_mapping::{DEFAULT_BYPASS_PATTERNS, Mapping, MappingOrigin};

/// Default debounce window for the compiled-artifact channel.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default delays between post-edit rescans of the output root.
pub const DEFAULT_RESCAN_DELAYS_MS: [u64; 4] = [250, 750, 1500, 3000];

/// Default command-line pattern identifying processes that may hold locks.
pub const DEFAULT_LOCK_HOLDER_PATTERN: &str = "org.apache.catalina.startup.Bootstrap";

/// Requested build strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyPreference {
    /// Pick from the detected layout.
    #[default]
    Auto,
    /// Compile with `javac` and sync directories.
    Local,
    /// Run Maven.
    Maven,
    /// Run Gradle.
    Gradle,
}

impl std::fmt::Display for StrategyPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Local => write!(f, "local"),
            Self::Maven => write!(f, "maven"),
            Self::Gradle => write!(f, "gradle"),
        }
    }
}

impl FromStr for StrategyPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "local" => Ok(Self::Local),
            "maven" => Ok(Self::Maven),
            "gradle" => Ok(Self::Gradle),
            other => Err(format!(
                "unknown build strategy '{other}' (expected auto, local, maven or gradle)"
            )),
        }
    }
}

/// Contents of `smartdeploy.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Quiet period before a compiled-artifact batch drains.
    pub debounce_ms: u64,
    /// Comma-separated file-name globs that are never deployed.
    pub bypass_patterns: String,
    /// Build strategy for `deploy`.
    pub build_strategy: StrategyPreference,
    /// Source encoding passed to the compiler.
    pub encoding: String,
    /// Explicit deployed application directory.
    pub deploy_dir: Option<PathBuf>,
    /// Server installation; the target defaults to `webapps/<artifact>` under it.
    pub server_home: Option<PathBuf>,
    /// Timeout for external build tools.
    pub build_timeout_secs: u64,
    /// Increasing delays between post-edit rescans.
    pub rescan_delays_ms: Vec<u64>,
    /// Command-line pattern of processes killed when a build hits a lock.
    pub lock_holder_pattern: String,
    /// Mapping file location, relative to the project root.
    pub mapping_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            bypass_patterns: DEFAULT_BYPASS_PATTERNS.to_string(),
            build_strategy: StrategyPreference::Auto,
            encoding: "UTF-8".to_string(),
            deploy_dir: None,
            server_home: None,
            build_timeout_secs: 600,
            rescan_delays_ms: DEFAULT_RESCAN_DELAYS_MS.to_vec(),
            lock_holder_pattern: DEFAULT_LOCK_HOLDER_PATTERN.to_string(),
            mapping_file: None,
        }
    }
}

/// One user mapping in the mapping file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    /// Source glob or directory.
    pub source: String,
    /// Destination template.
    #[serde(default)]
    pub destination: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Disabled entries are ignored.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Whether deploying through this entry warrants a server reload.
    #[serde(default)]
    pub needs_reload: bool,
    /// Only these extensions match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
    /// These extensions never match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_extensions: Option<Vec<String>>,
}

const fn enabled_by_default() -> bool {
    true
}

impl MappingEntry {
    /// The entry as a local-origin mapping.
    #[must_use]
    pub fn to_mapping(&self) -> Mapping {
        Mapping {
            source: self.source.clone(),
            destination: self.destination.clone(),
            triggers_reload: self.needs_reload,
            include_extensions: self.extensions.clone(),
            exclude_extensions: self.exclude_extensions.clone(),
            description: self.description.clone(),
            origin: MappingOrigin::Local,
            enabled: self.enabled,
        }
    }
}

/// `localDeploy` section of the mapping file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDeploy {
    /// User mappings, in priority order.
    #[serde(default)]
    pub mappings: Vec<MappingEntry>,
}

/// Contents of the mapping override file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingFile {
    /// Local deployment overrides.
    #[serde(default)]
    pub local_deploy: LocalDeploy,
}

impl MappingFile {
    /// Every entry as a local-origin mapping, disabled entries included.
    #[must_use]
    pub fn local_overrides(&self) -> Vec<Mapping> {
        self.local_deploy
            .mappings
            .iter()
            .map(MappingEntry::to_mapping)
            .collect()
    }
}
