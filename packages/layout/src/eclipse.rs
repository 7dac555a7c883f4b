//! Eclipse `.classpath` and WTP component parsing.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use crate::types::{LayoutKind, ProjectLayout, descriptor_path, directory_name};
use crate::xml::{XmlVisitor, is, walk};

/// Values read from `.classpath` and `.settings/org.eclipse.wst.common.component`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EclipseDescriptor {
    /// `classpathentry kind="src"` paths inside the project.
    pub source_paths: Vec<String>,
    /// `classpathentry kind="output"` path.
    pub output_path: Option<String>,
    /// `wb-resource` source path deployed at `/`.
    pub web_root: Option<String>,
    /// `context-root` property.
    pub context_root: Option<String>,
    /// `wb-module deploy-name`.
    pub deploy_name: Option<String>,
}

fn attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

struct ClasspathVisitor<'a>(&'a mut EclipseDescriptor);

impl XmlVisitor for ClasspathVisitor<'_> {
    fn element(&mut self, path: &[String], attributes: &[(String, String)]) {
        if !is(path, &["classpath", "classpathentry"]) {
            return;
        }
        let Some(entry_path) = attribute(attributes, "path") else {
            return;
        };

        match attribute(attributes, "kind") {
            // A leading slash references another workspace project.
            Some("src") if !entry_path.starts_with('/') => {
                self.0.source_paths.push(entry_path.to_string());
            }
            Some("output") => self.0.output_path = Some(entry_path.to_string()),
            _ => {}
        }
    }
}

struct ComponentVisitor<'a>(&'a mut EclipseDescriptor);

impl XmlVisitor for ComponentVisitor<'_> {
    fn element(&mut self, path: &[String], attributes: &[(String, String)]) {
        if is(path, &["project-modules", "wb-module"]) {
            self.0.deploy_name = attribute(attributes, "deploy-name").map(ToString::to_string);
        } else if is(path, &["project-modules", "wb-module", "wb-resource"]) {
            if attribute(attributes, "deploy-path") == Some("/") && self.0.web_root.is_none() {
                self.0.web_root = attribute(attributes, "source-path").map(ToString::to_string);
            }
        } else if is(path, &["project-modules", "wb-module", "property"])
            && attribute(attributes, "name") == Some("context-root")
        {
            self.0.context_root = attribute(attributes, "value").map(ToString::to_string);
        }
    }
}

/// Parse the contents of an Eclipse `.classpath` file.
///
/// # Errors
///
/// * If the document is not well-formed XML
pub fn parse_classpath(xml: &str) -> Result<EclipseDescriptor, quick_xml::Error> {
    let mut descriptor = EclipseDescriptor::default();
    walk(xml, &mut ClasspathVisitor(&mut descriptor))?;
    Ok(descriptor)
}

/// Merge the contents of a WTP component file into `descriptor`.
///
/// # Errors
///
/// * If the document is not well-formed XML
pub fn parse_component(
    xml: &str,
    descriptor: &mut EclipseDescriptor,
) -> Result<(), quick_xml::Error> {
    walk(xml, &mut ComponentVisitor(descriptor))
}

impl EclipseDescriptor {
    /// Build the layout for `root`, applying Eclipse defaults for absent values.
    #[must_use]
    pub fn into_layout(self, root: &Path, descriptor: Option<PathBuf>) -> ProjectLayout {
        let mut source_roots: Vec<PathBuf> = self
            .source_paths
            .iter()
            .filter_map(|p| descriptor_path(p, root))
            .collect();
        if source_roots.is_empty() {
            source_roots.push(PathBuf::from("src"));
        }

        let web_root = self
            .web_root
            .as_deref()
            .map(|p| p.trim_start_matches('/'))
            .and_then(|p| descriptor_path(p, root))
            .unwrap_or_else(|| PathBuf::from("WebContent"));

        ProjectLayout {
            kind: LayoutKind::Eclipse,
            root: root.to_path_buf(),
            compiled_output_root: self
                .output_path
                .as_deref()
                .and_then(|p| descriptor_path(p, root))
                .unwrap_or_else(|| PathBuf::from("bin")),
            source_roots,
            resource_roots: Vec::new(),
            web_resource_roots: vec![web_root],
            artifact_name: self
                .context_root
                .or(self.deploy_name)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| directory_name(root)),
            descriptor,
        }
    }
}
