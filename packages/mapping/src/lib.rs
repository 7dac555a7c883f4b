//! Glob mapping compiler and destination resolver for smartdeploy.
//!
//! A [`Mapping`] pairs a glob over project-relative paths with a destination
//! template inside the deployed application. This crate:
//!
//! * Generates the default mappings for a detected [`ProjectLayout`]
//! * Merges user overrides with the defaults ([`compile`])
//! * Translates globs into anchored regular expressions
//! * Resolves a matched file to its destination ([`resolve`])
//! * Filters copy-marker and editor scratch files ([`BypassFilter`])
//!
//! Pattern problems never fail compilation. A malformed pattern becomes a
//! mapping that matches nothing and carries a diagnostic for the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use smartdeploy_mapping::{compile, generated_mappings, resolve};
//!
//! let compiled = compile(&[], &generated_mappings(&layout));
//! for mapping in compiled.iter().filter(|m| m.matches_path(&file, &layout.root)) {
//!     let destination = resolve(mapping, &file, &layout.root, &webapp)?;
//! }
//! ```
//!
//! [`ProjectLayout`]: smartdeploy_layout::ProjectLayout

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod bypass;
mod compile;
mod defaults;
mod error;
mod pattern;
mod resolve;
mod scan;
mod types;

pub use bypass::{BypassFilter, DEFAULT_BYPASS_PATTERNS, is_transient};
pub use compile::{CompiledMapping, canonicalize_local, compile, compiled_output_override};
pub use defaults::generated_mappings;
pub use error::ResolveError;
pub use pattern::{Matcher, PatternSegments, PatternShape, glob_to_regex};
pub use resolve::{destination_for, relative_path, relative_portion, resolve};
pub use scan::matching_files;
pub use types::{Mapping, MappingOrigin};
