//! Configuration loading for smartdeploy.
//!
//! Configuration comes from three tiers, highest first:
//!
//! * The build-tool descriptor (`pom.xml`, `build.gradle`, `.classpath`)
//! * The user mapping file (`.smartdeploy/mappings.json`)
//! * Mappings generated for the detected layout
//!
//! Engine settings live in `smartdeploy.toml` at the project root. Every key
//! is optional.
//!
//! # Example
//!
//! ```rust,ignore
//! use smartdeploy_config::{DeployConfig, find_project_root};
//!
//! let root = find_project_root(&std::env::current_dir()?);
//! let config = DeployConfig::load(&root)?;
//! for mapping in config.compile() {
//!     println!("{} -> {}", mapping.mapping.source, mapping.mapping.destination);
//! }
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod deploy;
mod discovery;
mod error;
mod json_loader;
mod toml_loader;
mod types;

pub use deploy::DeployConfig;
pub use discovery::{
    DEFAULT_MAPPING_FILE, SETTINGS_FILE, canonical_path, find_project_root, mapping_file_path,
    settings_path,
};
pub use error::ConfigError;
pub use json_loader::{load_mapping_file, starter_mapping_file, write_mapping_file};
pub use toml_loader::load_settings;
pub use types::{
    DEFAULT_DEBOUNCE_MS, DEFAULT_LOCK_HOLDER_PATTERN, DEFAULT_RESCAN_DELAYS_MS, LocalDeploy,
    MappingEntry, MappingFile, Settings, StrategyPreference,
};
