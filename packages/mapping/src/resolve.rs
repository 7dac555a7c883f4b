//! Destination resolution.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::compile::CompiledMapping;
use crate::error::ResolveError;
use crate::pattern::{PatternSegments, PatternShape};

/// `path` relative to `root` with `/` separators, if it lies under `root`.
#[must_use]
pub fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

fn base_name(relative: &str) -> String {
    relative.rsplit('/').next().unwrap_or(relative).to_string()
}

/// The part of `relative` that is carried into the destination template.
///
/// Rules, first success wins:
///
/// 1. `prefix/**/*...`: everything after the prefix
/// 2. `prefix/**/suffix`: the directories between the prefix and the suffix,
///    then the base name
/// 3. One-level wildcards: everything after the pattern's directory part
/// 4. Otherwise the base name
#[must_use]
pub fn relative_portion(segments: &PatternSegments, relative: &str) -> String {
    let relative = relative.replace('\\', "/");
    let base = base_name(&relative);

    let Some(after_prefix) = relative.strip_prefix(&segments.literal_prefix) else {
        return base;
    };
    if after_prefix.is_empty() {
        return base;
    }

    match segments.shape {
        PatternShape::RecursiveAny | PatternShape::SingleLevel => after_prefix.to_string(),
        PatternShape::RecursiveSuffix { suffix_segments } => {
            let parts: Vec<&str> = after_prefix.split('/').collect();
            if parts.len() <= suffix_segments {
                return base;
            }
            let middle = &parts[..parts.len() - suffix_segments];
            format!("{}/{base}", middle.join("/"))
        }
        PatternShape::Literal => base,
    }
}

/// Destination for `source` without touching the filesystem.
///
/// The first `{relative}` in the template is replaced by the relative
/// portion. A template without the placeholder is a directory the portion is
/// joined onto, except for a wildcard-free source mapped to a file name,
/// which is copied to the template verbatim.
#[must_use]
pub fn destination_for(
    mapping: &CompiledMapping,
    source: &Path,
    project_root: &Path,
    webapp_root: &Path,
) -> PathBuf {
    let relative = relative_path(source, project_root).unwrap_or_else(|| {
        source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    });
    let portion = relative_portion(&mapping.segments, &relative);
    let template = mapping.mapping.destination.replace('\\', "/");

    let destination = if template.contains("{relative}") {
        template.replacen("{relative}", &portion, 1)
    } else if mapping.segments.shape == PatternShape::Literal
        && !template.is_empty()
        && !template.ends_with('/')
    {
        template
    } else if template.trim_end_matches('/').is_empty() {
        portion
    } else {
        format!("{}/{portion}", template.trim_end_matches('/'))
    };

    path_clean::clean(webapp_root.join(destination.trim_start_matches('/')))
}

/// Destination for `source`, creating its parent directories.
///
/// # Arguments
///
/// * `mapping` - The mapping that matched `source`
/// * `source` - Absolute path of the matched file
/// * `project_root` - Root the mapping's pattern is relative to
/// * `webapp_root` - Deployed application root
///
/// # Errors
///
/// * If a parent directory cannot be created
pub fn resolve(
    mapping: &CompiledMapping,
    source: &Path,
    project_root: &Path,
    webapp_root: &Path,
) -> Result<PathBuf, ResolveError> {
    let destination = destination_for(mapping, source, project_root, webapp_root);

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| ResolveError::CreateParent {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    log::debug!(
        "Resolved {} -> {}",
        source.display(),
        destination.display()
    );
    Ok(destination)
}
