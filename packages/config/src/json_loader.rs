//! Mapping override file loader.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use smartdeploy_layout::ProjectLayout;

use crate::error::ConfigError;
use crate::types::{LocalDeploy, MappingEntry, MappingFile};

/// Load the mapping file at `path`. A missing file is an empty one.
///
/// # Errors
///
/// * If the file exists but cannot be read
/// * If the file is not valid mapping JSON
pub fn load_mapping_file(path: &Path) -> Result<MappingFile, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("No mapping file at {}", path.display());
            return Ok(MappingFile::default());
        }
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    if content.trim().is_empty() {
        return Ok(MappingFile::default());
    }

    let file: MappingFile =
        serde_json::from_str(&content).map_err(|e| ConfigError::JsonParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    log::debug!(
        "Loaded {} mappings from {}",
        file.local_deploy.mappings.len(),
        path.display()
    );

    Ok(file)
}

/// Write `file` to `path` unless something already exists there.
///
/// Returns `false` when the path was left untouched.
///
/// # Errors
///
/// * If the parent directory or the file cannot be written
pub fn write_mapping_file(path: &Path, file: &MappingFile) -> Result<bool, ConfigError> {
    if path.exists() {
        log::debug!("Mapping file {} already exists", path.display());
        return Ok(false);
    }

    let write_error = |source: std::io::Error| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }

    let mut json = serde_json::to_string_pretty(file).map_err(|e| ConfigError::JsonParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    json.push('\n');

    fs::write(path, json).map_err(write_error)?;
    Ok(true)
}

/// Starter mapping file for `layout`, with every example disabled.
#[must_use]
pub fn starter_mapping_file(layout: &ProjectLayout) -> MappingFile {
    let output = layout
        .compiled_output_root
        .to_string_lossy()
        .replace('\\', "/");

    MappingFile {
        local_deploy: LocalDeploy {
            mappings: vec![
                MappingEntry {
                    source: "conf".to_string(),
                    destination: "WEB-INF/classes/conf".to_string(),
                    description: "Copy a configuration directory onto the classpath".to_string(),
                    enabled: false,
                    needs_reload: false,
                    extensions: None,
                    exclude_extensions: None,
                },
                MappingEntry {
                    source: format!("{output}/**/*.class"),
                    destination: "WEB-INF/classes/{relative}".to_string(),
                    description: "Compiled classes from a non-standard output directory"
                        .to_string(),
                    enabled: false,
                    needs_reload: true,
                    extensions: Some(vec![".class".to_string()]),
                    exclude_extensions: None,
                },
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_mapping_file_is_empty() {
        let dir = TempDir::new().unwrap();

        let file = load_mapping_file(&dir.path().join("mappings.json")).unwrap();

        assert_eq!(file, MappingFile::default());
    }

    #[test]
    fn test_malformed_mapping_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mappings.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            load_mapping_file(&path),
            Err(ConfigError::JsonParseError { .. })
        ));
    }

    #[test]
    fn test_write_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".smartdeploy/mappings.json");
        let layout = ProjectLayout::plain(dir.path());

        assert!(write_mapping_file(&path, &starter_mapping_file(&layout)).unwrap());
        fs::write(&path, "{}").unwrap();
        assert!(!write_mapping_file(&path, &starter_mapping_file(&layout)).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_starter_file_round_trips_disabled() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mappings.json");
        let layout = ProjectLayout::plain(dir.path());

        write_mapping_file(&path, &starter_mapping_file(&layout)).unwrap();
        let loaded = load_mapping_file(&path).unwrap();

        assert_eq!(loaded.local_deploy.mappings.len(), 2);
        assert!(loaded.local_deploy.mappings.iter().all(|m| !m.enabled));
        assert_eq!(loaded.local_deploy.mappings[1].source, "bin/**/*.class");
    }
}
