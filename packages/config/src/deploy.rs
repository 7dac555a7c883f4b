//! Assembled deployment configuration.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use smartdeploy_layout::{LayoutKind, ProjectLayout, detect};
use smartdeploy_mapping::{
    BypassFilter, CompiledMapping, Mapping, compile, compiled_output_override, generated_mappings,
};

use crate::discovery::{canonical_path, mapping_file_path, settings_path};
use crate::error::ConfigError;
use crate::json_loader::load_mapping_file;
use crate::toml_loader::load_settings;
use crate::types::Settings;

/// Everything the engine needs for one activation.
///
/// Built once from disk and never mutated; a reload builds a new value.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Detected layout, with descriptor values applied.
    pub layout: ProjectLayout,
    /// Settings from `smartdeploy.toml` or the defaults.
    pub settings: Settings,
    /// Mappings generated for the layout.
    pub mappings: Vec<Mapping>,
    /// Mappings from the user's mapping file.
    pub local_overrides: Vec<Mapping>,
    /// Quiet period for the compiled-artifact channel.
    pub debounce_window: Duration,
    /// Output root implied by a local `.class` mapping.
    pub compiled_output_override: Option<PathBuf>,
    /// Location of the mapping file, whether or not it exists.
    pub mapping_file: PathBuf,
    /// Location of the settings file, whether or not it exists.
    pub settings_file: PathBuf,
}

impl DeployConfig {
    /// Load the configuration for `project_root`.
    ///
    /// # Arguments
    ///
    /// * `project_root` - Workspace root, resolved to its canonical form
    ///
    /// # Errors
    ///
    /// * If `smartdeploy.toml` exists but is invalid
    /// * If the mapping file exists but is invalid
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let project_root = &canonical_path(project_root);
        let settings_file = settings_path(project_root);
        let settings = if settings_file.is_file() {
            load_settings(&settings_file)?
        } else {
            log::debug!("No settings file, using defaults");
            Settings::default()
        };

        let layout = detect(project_root);
        log::info!(
            "Detected {} project '{}' at {}",
            layout.kind,
            layout.artifact_name,
            project_root.display()
        );

        let mapping_file = mapping_file_path(project_root, &settings);
        let local_overrides = load_mapping_file(&mapping_file)?.local_overrides();

        Ok(Self::from_parts(
            layout,
            settings,
            local_overrides,
            mapping_file,
            settings_file,
        ))
    }

    /// Assemble a configuration from already-loaded parts.
    #[must_use]
    pub fn from_parts(
        layout: ProjectLayout,
        settings: Settings,
        local_overrides: Vec<Mapping>,
        mapping_file: PathBuf,
        settings_file: PathBuf,
    ) -> Self {
        let mappings = generated_mappings(&layout);
        let compiled_output_override = compiled_output_override(&local_overrides);
        let debounce_window = Duration::from_millis(settings.debounce_ms);

        Self {
            layout,
            settings,
            mappings,
            local_overrides,
            debounce_window,
            compiled_output_override,
            mapping_file,
            settings_file,
        }
    }

    /// Detected project kind.
    #[must_use]
    pub const fn project_type(&self) -> LayoutKind {
        self.layout.kind
    }

    /// Deployed context name.
    #[must_use]
    pub fn artifact_name(&self) -> &str {
        &self.layout.artifact_name
    }

    /// Absolute project root.
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.layout.root
    }

    /// Merge local overrides with generated mappings and compile them.
    #[must_use]
    pub fn compile(&self) -> Vec<CompiledMapping> {
        compile(&self.local_overrides, &self.mappings)
    }

    /// Absolute output root the compiled-artifact channel watches.
    #[must_use]
    pub fn effective_output_root(&self) -> PathBuf {
        self.compiled_output_override
            .as_ref()
            .map_or_else(|| self.layout.output_root(), |p| self.layout.absolute(p))
    }

    /// Deployed application directory, if one is configured.
    ///
    /// `deployDir` wins; otherwise `<serverHome>/webapps/<artifactName>`.
    #[must_use]
    pub fn deploy_target(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.settings.deploy_dir {
            return Some(self.layout.absolute(dir));
        }
        self.settings.server_home.as_ref().map(|home| {
            self.layout
                .absolute(home)
                .join("webapps")
                .join(&self.layout.artifact_name)
        })
    }

    /// Bypass filter built from the settings.
    #[must_use]
    pub fn bypass_filter(&self) -> BypassFilter {
        BypassFilter::new(&self.settings.bypass_patterns)
    }

    /// Delays between post-edit rescans.
    #[must_use]
    pub fn rescan_delays(&self) -> Vec<Duration> {
        self.settings
            .rescan_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }

    /// Timeout for external build tools.
    #[must_use]
    pub const fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.build_timeout_secs)
    }
}
