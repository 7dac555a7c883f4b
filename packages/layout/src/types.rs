//! Layout types.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Kind of project detected at a workspace root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// `pom.xml` at the root.
    Maven,
    /// `build.gradle` or `build.gradle.kts` at the root.
    Gradle,
    /// Eclipse `.classpath` at the root.
    Eclipse,
    /// Anything else.
    Plain,
}

impl LayoutKind {
    /// Directory the kind's build tool writes archives to, relative to the root.
    #[must_use]
    pub const fn archive_dir(self) -> &'static str {
        match self {
            Self::Maven => "target",
            Self::Gradle => "build/libs",
            Self::Eclipse | Self::Plain => "dist",
        }
    }
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Maven => write!(f, "maven"),
            Self::Gradle => write!(f, "gradle"),
            Self::Eclipse => write!(f, "eclipse"),
            Self::Plain => write!(f, "plain"),
        }
    }
}

/// Detected shape of a project.
///
/// All roots are relative to [`ProjectLayout::root`]. A layout is never
/// updated in place; detect again to pick up descriptor changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Kind of project.
    pub kind: LayoutKind,
    /// Absolute workspace root.
    pub root: PathBuf,
    /// Where compiled classes are written.
    pub compiled_output_root: PathBuf,
    /// Java source roots.
    pub source_roots: Vec<PathBuf>,
    /// Non-code resources copied next to compiled classes.
    pub resource_roots: Vec<PathBuf>,
    /// Exploded web application sources.
    pub web_resource_roots: Vec<PathBuf>,
    /// Deployed context name.
    pub artifact_name: String,
    /// Descriptor that supplied values, if any was read successfully.
    pub descriptor: Option<PathBuf>,
}

impl ProjectLayout {
    /// The fallback layout: `src` sources, `bin` output, `web` resources.
    #[must_use]
    pub fn plain(root: &Path) -> Self {
        let web_root = ["web", "WebContent", "WebRoot", "webapp"]
            .into_iter()
            .find(|candidate| root.join(candidate).is_dir())
            .unwrap_or("web");

        Self {
            kind: LayoutKind::Plain,
            root: root.to_path_buf(),
            compiled_output_root: PathBuf::from("bin"),
            source_roots: vec![PathBuf::from("src")],
            resource_roots: Vec::new(),
            web_resource_roots: vec![PathBuf::from(web_root)],
            artifact_name: directory_name(root),
            descriptor: None,
        }
    }

    /// Resolve a layout-relative path against the root.
    #[must_use]
    pub fn absolute(&self, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.root.join(relative)
        }
    }

    /// Absolute compiled output root.
    #[must_use]
    pub fn output_root(&self) -> PathBuf {
        self.absolute(&self.compiled_output_root)
    }

    /// Absolute source roots.
    #[must_use]
    pub fn source_roots_absolute(&self) -> Vec<PathBuf> {
        self.source_roots.iter().map(|p| self.absolute(p)).collect()
    }

    /// Absolute web resource roots.
    #[must_use]
    pub fn web_roots_absolute(&self) -> Vec<PathBuf> {
        self.web_resource_roots
            .iter()
            .map(|p| self.absolute(p))
            .collect()
    }

    /// Absolute resource roots.
    #[must_use]
    pub fn resource_roots_absolute(&self) -> Vec<PathBuf> {
        self.resource_roots
            .iter()
            .map(|p| self.absolute(p))
            .collect()
    }
}

/// Name of the last path component, or `ROOT` for a bare root.
#[must_use]
pub(crate) fn directory_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "ROOT".to_string())
}

/// Normalize a descriptor-supplied directory into a root-relative path.
///
/// Strips `${basedir}`-style prefixes and leading `./`. Values that still contain
/// unresolved `${...}` properties are rejected so the caller keeps its default.
#[must_use]
pub(crate) fn descriptor_path(value: &str, root: &Path) -> Option<PathBuf> {
    let mut value = value.trim().replace('\\', "/");
    for prefix in ["${project.basedir}", "${basedir}"] {
        if let Some(rest) = value.strip_prefix(prefix) {
            value = rest.trim_start_matches('/').to_string();
        }
    }
    value = value.replace("${project.build.directory}", "target");

    if value.is_empty() || value.contains("${") {
        return None;
    }

    let path = PathBuf::from(value.trim_start_matches("./"));
    if path.is_absolute() {
        return Some(path.strip_prefix(root).map_or(path.clone(), Path::to_path_buf));
    }
    Some(path)
}
