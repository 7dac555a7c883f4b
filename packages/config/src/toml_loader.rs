//! `smartdeploy.toml` loader.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::types::Settings;

/// Load and validate a settings file.
///
/// # Arguments
///
/// * `path` - Path to the TOML settings file
///
/// # Errors
///
/// * If the file cannot be read
/// * If the file cannot be parsed as TOML
/// * If a setting is out of range
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    log::debug!("Loading settings from {}", path.display());

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let settings: Settings = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate(&settings, path)?;

    log::debug!(
        "Loaded settings: debounce {}ms, strategy {}",
        settings.debounce_ms,
        settings.build_strategy
    );

    Ok(settings)
}

fn validate(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    let invalid = |key: &'static str, message: &str| ConfigError::InvalidSetting {
        path: path.to_path_buf(),
        key,
        message: message.to_string(),
    };

    if settings.build_timeout_secs == 0 {
        return Err(invalid("buildTimeoutSecs", "must be greater than zero"));
    }
    if settings.encoding.trim().is_empty() {
        return Err(invalid("encoding", "must not be empty"));
    }
    if settings.rescan_delays_ms.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid("rescanDelaysMs", "delays must be strictly increasing"));
    }

    Ok(())
}
