//! `pom.xml` parsing.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use crate::types::{LayoutKind, ProjectLayout, descriptor_path, directory_name};
use crate::xml::{XmlVisitor, ends_with, is, walk};

/// Values read from a Maven `pom.xml`.
///
/// Every field is optional; absent values fall back to the Maven defaults
/// when the descriptor is turned into a [`ProjectLayout`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MavenDescriptor {
    /// `project/artifactId`.
    pub artifact_id: Option<String>,
    /// `project/version`, or the parent's version.
    pub version: Option<String>,
    /// `project/build/finalName`.
    pub final_name: Option<String>,
    /// `project/build/outputDirectory`.
    pub output_directory: Option<String>,
    /// `project/build/sourceDirectory`.
    pub source_directory: Option<String>,
    /// Every `project/build/resources/resource/directory`.
    pub resource_directories: Vec<String>,
    /// `warSourceDirectory` from the war plugin configuration.
    pub war_source_directory: Option<String>,
}

#[derive(Default)]
struct PomVisitor {
    descriptor: MavenDescriptor,
    parent_version: Option<String>,
}

impl XmlVisitor for PomVisitor {
    fn text(&mut self, path: &[String], text: &str) {
        if text.is_empty() {
            return;
        }
        let value = Some(text.to_string());
        let d = &mut self.descriptor;

        if is(path, &["project", "artifactId"]) {
            d.artifact_id = value;
        } else if is(path, &["project", "version"]) {
            d.version = value;
        } else if is(path, &["project", "parent", "version"]) {
            self.parent_version = value;
        } else if is(path, &["project", "build", "finalName"]) {
            d.final_name = value;
        } else if is(path, &["project", "build", "outputDirectory"]) {
            d.output_directory = value;
        } else if is(path, &["project", "build", "sourceDirectory"]) {
            d.source_directory = value;
        } else if is(
            path,
            &["project", "build", "resources", "resource", "directory"],
        ) {
            d.resource_directories.push(text.to_string());
        } else if ends_with(path, &["configuration", "warSourceDirectory"]) {
            d.war_source_directory = value;
        }
    }
}

/// Parse the contents of a `pom.xml`.
///
/// # Errors
///
/// * If the document is not well-formed XML
pub fn parse_pom(xml: &str) -> Result<MavenDescriptor, quick_xml::Error> {
    let mut visitor = PomVisitor::default();
    walk(xml, &mut visitor)?;

    let mut descriptor = visitor.descriptor;
    if descriptor.version.is_none() {
        descriptor.version = visitor.parent_version;
    }
    Ok(descriptor)
}

impl MavenDescriptor {
    /// Deployed context name: `finalName` with common properties substituted,
    /// else `artifactId`.
    #[must_use]
    pub fn artifact_name(&self) -> Option<String> {
        let substituted = self.final_name.as_ref().map(|name| {
            let mut name = name.clone();
            if let Some(artifact_id) = &self.artifact_id {
                name = name
                    .replace("${project.artifactId}", artifact_id)
                    .replace("${artifactId}", artifact_id);
            }
            if let Some(version) = &self.version {
                name = name
                    .replace("${project.version}", version)
                    .replace("${version}", version);
            }
            name
        });

        substituted
            .filter(|name| !name.is_empty() && !name.contains("${"))
            .or_else(|| self.artifact_id.clone())
    }

    /// Build the layout for `root`, applying Maven defaults for absent values.
    #[must_use]
    pub fn into_layout(self, root: &Path, descriptor: Option<PathBuf>) -> ProjectLayout {
        let resolve = |value: Option<&String>, default: &str| {
            value
                .and_then(|v| descriptor_path(v, root))
                .unwrap_or_else(|| PathBuf::from(default))
        };

        let mut resource_roots: Vec<PathBuf> = self
            .resource_directories
            .iter()
            .filter_map(|dir| descriptor_path(dir, root))
            .collect();
        if resource_roots.is_empty() {
            resource_roots.push(PathBuf::from("src/main/resources"));
        }

        ProjectLayout {
            kind: LayoutKind::Maven,
            root: root.to_path_buf(),
            compiled_output_root: resolve(self.output_directory.as_ref(), "target/classes"),
            source_roots: vec![resolve(self.source_directory.as_ref(), "src/main/java")],
            resource_roots,
            web_resource_roots: vec![resolve(
                self.war_source_directory.as_ref(),
                "src/main/webapp",
            )],
            artifact_name: self.artifact_name().unwrap_or_else(|| directory_name(root)),
            descriptor,
        }
    }
}
