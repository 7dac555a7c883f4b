//! Immutable scheduler state and its reloading.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use smartdeploy_config::{ConfigError, DeployConfig, canonical_path};
use smartdeploy_mapping::{BypassFilter, CompiledMapping};

/// Everything a watch callback needs, built in one piece.
///
/// The scheduler never mutates a snapshot. A configuration change builds a
/// new one which is swapped in atomically.
#[derive(Debug, Clone)]
pub struct WatchSnapshot {
    /// Absolute project root; mapping patterns are relative to it.
    pub project_root: PathBuf,
    /// Deployed application directory.
    pub webapp_root: PathBuf,
    /// Absolute output root of the compiled-artifact channel.
    pub output_root: PathBuf,
    /// Absolute source roots, used to locate compiled classes for a source.
    pub source_roots: Vec<PathBuf>,
    /// Merged mapping set, local overrides first.
    pub mappings: Vec<CompiledMapping>,
    /// Copy-marker filter.
    pub bypass: BypassFilter,
    /// Quiet period of the compiled-artifact channel.
    pub debounce_window: Duration,
    /// Probe offsets for post-edit rescans, increasing.
    pub rescan_delays: Vec<Duration>,
    /// Files whose change triggers a configuration reload.
    pub config_files: Vec<PathBuf>,
}

impl WatchSnapshot {
    /// Build a snapshot from a loaded configuration.
    ///
    /// Every path is rebased onto the canonical project root so it compares
    /// equal to the paths the file watcher reports.
    ///
    /// # Arguments
    ///
    /// * `config` - Loaded deployment configuration
    /// * `webapp_root` - Deployed application directory
    #[must_use]
    pub fn from_config(config: &DeployConfig, webapp_root: &Path) -> Self {
        let declared_root = config.project_root();
        let project_root = canonical_path(declared_root);
        let rebase = |path: &Path| match path.strip_prefix(declared_root) {
            Ok(relative) => project_root.join(relative),
            Err(_) => canonical_path(path),
        };

        Self {
            webapp_root: rebase(webapp_root),
            output_root: rebase(&config.effective_output_root()),
            source_roots: config
                .layout
                .source_roots_absolute()
                .iter()
                .map(|root| rebase(root))
                .collect(),
            mappings: config.compile(),
            bypass: config.bypass_filter(),
            debounce_window: config.debounce_window,
            rescan_delays: config.rescan_delays(),
            config_files: vec![rebase(&config.settings_file), rebase(&config.mapping_file)],
            project_root,
        }
    }

    /// Whether `path` is one of the configuration files.
    #[must_use]
    pub fn is_config_file(&self, path: &Path) -> bool {
        self.config_files.iter().any(|f| f == path)
    }

    /// `(pattern, diagnostic)` for every mapping that was refused.
    #[must_use]
    pub fn rejected_patterns(&self) -> Vec<(String, String)> {
        self.mappings
            .iter()
            .filter_map(|m| {
                m.diagnostic()
                    .map(|d| (m.mapping.source.clone(), d.to_string()))
            })
            .collect()
    }
}

/// Rebuilds a snapshot after a configuration file changed.
pub trait Reload: Send + Sync {
    /// Build a fresh snapshot.
    ///
    /// # Errors
    ///
    /// * If the configuration on disk is invalid
    fn reload(&self) -> Result<WatchSnapshot, ConfigError>;
}

impl<F> Reload for F
where
    F: Fn() -> Result<WatchSnapshot, ConfigError> + Send + Sync,
{
    fn reload(&self) -> Result<WatchSnapshot, ConfigError> {
        self()
    }
}

/// Reloads [`DeployConfig`] from the project root, keeping the webapp root.
#[derive(Debug, Clone)]
pub struct ConfigReloader {
    project_root: PathBuf,
    webapp_root: PathBuf,
}

impl ConfigReloader {
    /// Create a reloader for `project_root` deploying into `webapp_root`.
    #[must_use]
    pub fn new(project_root: &Path, webapp_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            webapp_root: webapp_root.to_path_buf(),
        }
    }
}

impl Reload for ConfigReloader {
    fn reload(&self) -> Result<WatchSnapshot, ConfigError> {
        let config = DeployConfig::load(&self.project_root)?;
        Ok(WatchSnapshot::from_config(&config, &self.webapp_root))
    }
}
