//! Layout detection entry point.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::{Path, PathBuf};

use crate::eclipse::{EclipseDescriptor, parse_classpath, parse_component};
use crate::gradle::parse_gradle;
use crate::maven::parse_pom;
use crate::types::ProjectLayout;

const GRADLE_SCRIPTS: [&str; 2] = ["build.gradle", "build.gradle.kts"];
const GRADLE_SETTINGS: [&str; 2] = ["settings.gradle", "settings.gradle.kts"];
const COMPONENT_FILE: &str = ".settings/org.eclipse.wst.common.component";

/// Classify `root` and derive its layout.
///
/// Precedence is Maven (`pom.xml`), Gradle (`build.gradle[.kts]`), Eclipse
/// (`.classpath`), then plain. A descriptor that cannot be read or parsed
/// contributes nothing and the kind's defaults apply. Never touches the
/// filesystem beyond reading.
///
/// # Arguments
///
/// * `root` - Workspace root to classify
#[must_use]
pub fn detect(root: &Path) -> ProjectLayout {
    log::debug!("Detecting project layout in {}", root.display());

    let pom = root.join("pom.xml");
    if pom.is_file() {
        let parsed = read(&pom).and_then(|xml| match parse_pom(&xml) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                log::debug!("Ignoring malformed {}: {e}", pom.display());
                None
            }
        });
        let source = parsed.is_some().then(|| pom.clone());
        return parsed
            .unwrap_or_default()
            .into_layout(root, source);
    }

    if let Some(script) = GRADLE_SCRIPTS
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
    {
        let settings = GRADLE_SETTINGS
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
            .and_then(|path| read(&path));
        let build = read(&script);
        let source = build.is_some().then(|| script.clone());
        return parse_gradle(build.as_deref().unwrap_or_default(), settings.as_deref())
            .into_layout(root, source);
    }

    let classpath = root.join(".classpath");
    if classpath.is_file() {
        return detect_eclipse(root, &classpath);
    }

    log::debug!("No build descriptor found, using plain layout");
    ProjectLayout::plain(root)
}

fn detect_eclipse(root: &Path, classpath: &Path) -> ProjectLayout {
    let mut descriptor = read(classpath).and_then(|xml| match parse_classpath(&xml) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            log::debug!("Ignoring malformed {}: {e}", classpath.display());
            None
        }
    });
    let source: Option<PathBuf> = descriptor.is_some().then(|| classpath.to_path_buf());

    let component = root.join(COMPONENT_FILE);
    if let Some(xml) = read(&component) {
        let target = descriptor.get_or_insert_with(EclipseDescriptor::default);
        let mut merged = target.clone();
        match parse_component(&xml, &mut merged) {
            Ok(()) => *target = merged,
            Err(e) => log::debug!("Ignoring malformed {}: {e}", component.display()),
        }
    }

    descriptor.unwrap_or_default().into_layout(root, source)
}

fn read(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    fs::read_to_string(path)
        .inspect_err(|e| log::debug!("Failed to read {}: {e}", path.display()))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LayoutKind;
    use tempfile::TempDir;

    #[test]
    fn test_detect_prefers_maven_over_gradle() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pom.xml"),
            "<project><artifactId>app</artifactId></project>",
        )
        .unwrap();
        fs::write(dir.path().join("build.gradle"), "").unwrap();
        fs::write(dir.path().join(".classpath"), "<classpath/>").unwrap();

        let layout = detect(dir.path());

        assert_eq!(layout.kind, LayoutKind::Maven);
        assert_eq!(layout.artifact_name, "app");
        assert_eq!(layout.descriptor, Some(dir.path().join("pom.xml")));
    }

    #[test]
    fn test_detect_gradle_kts_with_settings() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("build.gradle.kts"), "plugins { war }").unwrap();
        fs::write(
            dir.path().join("settings.gradle.kts"),
            "rootProject.name = \"catalog\"",
        )
        .unwrap();

        let layout = detect(dir.path());

        assert_eq!(layout.kind, LayoutKind::Gradle);
        assert_eq!(layout.artifact_name, "catalog");
    }

    #[test]
    fn test_detect_eclipse_reads_component() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".classpath"),
            r#"<classpath><classpathentry kind="output" path="classes"/></classpath>"#,
        )
        .unwrap();
        fs::create_dir(dir.path().join(".settings")).unwrap();
        fs::write(
            dir.path().join(COMPONENT_FILE),
            r#"<project-modules><wb-module deploy-name="legacy"><wb-resource deploy-path="/" source-path="/web"/></wb-module></project-modules>"#,
        )
        .unwrap();

        let layout = detect(dir.path());

        assert_eq!(layout.kind, LayoutKind::Eclipse);
        assert_eq!(layout.compiled_output_root, PathBuf::from("classes"));
        assert_eq!(layout.web_resource_roots, vec![PathBuf::from("web")]);
        assert_eq!(layout.artifact_name, "legacy");
    }

    #[test]
    fn test_malformed_pom_falls_back_to_maven_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pom.xml"), "<project><build></project>").unwrap();

        let layout = detect(dir.path());

        assert_eq!(layout.kind, LayoutKind::Maven);
        assert_eq!(layout.compiled_output_root, PathBuf::from("target/classes"));
        assert_eq!(layout.descriptor, None);
    }

    #[test]
    fn test_detect_plain_creates_nothing() {
        let dir = TempDir::new().unwrap();

        let layout = detect(dir.path());

        assert_eq!(layout.kind, LayoutKind::Plain);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
