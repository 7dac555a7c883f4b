//! Mapping set compilation.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::pattern::{Matcher, PatternSegments};
use crate::resolve::relative_path;
use crate::types::Mapping;

const RELATIVE: &str = "{relative}";

/// A mapping with its matcher and raw pattern segments.
#[derive(Debug, Clone)]
pub struct CompiledMapping {
    /// The (canonicalized) mapping.
    pub mapping: Mapping,
    /// Matcher over relative paths.
    pub matcher: Matcher,
    /// Literal prefix and extraction rule.
    pub segments: PatternSegments,
}

impl CompiledMapping {
    /// Compile a single mapping as-is.
    #[must_use]
    pub fn new(mapping: Mapping) -> Self {
        let matcher = Matcher::new(&mapping.source);
        let segments = PatternSegments::new(&mapping.source);
        Self {
            mapping,
            matcher,
            segments,
        }
    }

    /// Whether the mapping accepts a `/`-separated project-relative path.
    #[must_use]
    pub fn matches(&self, relative: &str) -> bool {
        self.mapping.enabled
            && self.mapping.accepts_extension(relative)
            && self.matcher.is_match(relative)
    }

    /// Whether the mapping accepts an absolute path under `project_root`.
    #[must_use]
    pub fn matches_path(&self, path: &Path, project_root: &Path) -> bool {
        relative_path(path, project_root).is_some_and(|relative| self.matches(&relative))
    }

    /// Diagnostic when the source pattern was refused.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        self.matcher.diagnostic()
    }

    /// Regular expression source of the matcher.
    #[must_use]
    pub fn matcher_source(&self) -> &str {
        self.matcher.source()
    }
}

/// Normalize a user-supplied mapping.
///
/// A wildcard-free source whose last segment has no extension names a
/// directory and becomes `dir/**/*`. A wildcard source whose destination
/// lacks `{relative}` gets `/{relative}` appended.
#[must_use]
pub fn canonicalize_local(mapping: &Mapping) -> Mapping {
    let mut mapping = mapping.clone();
    let mut source = mapping.source.trim().replace('\\', "/");
    if let Some(rest) = source.strip_prefix("./") {
        source = rest.to_string();
    }

    let has_wildcard = source.contains(['*', '?']);
    if !has_wildcard && !source.is_empty() {
        let last = source.trim_end_matches('/').rsplit('/').next().unwrap_or("");
        if source.ends_with('/') || !last.contains('.') {
            source = format!("{}/**/*", source.trim_end_matches('/'));
        }
    }

    let mut destination = mapping.destination.trim().replace('\\', "/");
    if source.contains(['*', '?']) && !destination.contains(RELATIVE) {
        destination = if destination.trim_end_matches('/').is_empty() {
            RELATIVE.to_string()
        } else {
            format!("{}/{RELATIVE}", destination.trim_end_matches('/'))
        };
    }

    mapping.source = source;
    mapping.destination = destination;
    mapping
}

/// Merge user overrides with generated mappings and compile the result.
///
/// Enabled local overrides come first (canonicalized), then enabled generated
/// mappings whose `(source, destination)` key has not been seen. Output order
/// is stable for equal input.
#[must_use]
pub fn compile(local_overrides: &[Mapping], generated: &[Mapping]) -> Vec<CompiledMapping> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut compiled = Vec::with_capacity(local_overrides.len() + generated.len());

    let locals = local_overrides
        .iter()
        .filter(|m| m.enabled)
        .map(canonicalize_local);
    let defaults = generated.iter().filter(|m| m.enabled).cloned();

    for mapping in locals.chain(defaults) {
        if !seen.insert(mapping.key()) {
            log::debug!(
                "Skipping {} mapping {} -> {}: key already present",
                mapping.origin,
                mapping.source,
                mapping.destination
            );
            continue;
        }
        let entry = CompiledMapping::new(mapping);
        if let Some(diagnostic) = entry.diagnostic() {
            log::debug!(
                "Pattern {:?} refused: {diagnostic}",
                entry.mapping.source
            );
        }
        compiled.push(entry);
    }

    compiled
}

/// Output root implied by the first enabled local mapping over `.class` files.
///
/// The literal directory prefix of that source replaces the detected compiled
/// output root.
#[must_use]
pub fn compiled_output_override(local_overrides: &[Mapping]) -> Option<PathBuf> {
    local_overrides
        .iter()
        .filter(|m| m.enabled)
        .map(|m| m.source.trim().replace('\\', "/"))
        .find(|source| source.to_ascii_lowercase().ends_with(".class"))
        .map(|source| PatternSegments::new(&source).base_directory().to_string())
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
}
