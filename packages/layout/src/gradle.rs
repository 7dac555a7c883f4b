//! Gradle build script scanning.
//!
//! Groovy and Kotlin DSL scripts are not evaluated. The handful of
//! assignments that affect deployment are located with regular expressions
//! after comments are stripped.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::types::{LayoutKind, ProjectLayout, descriptor_path, directory_name};

static COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)/\*.*?\*/|(?m)//[^\n]*$").expect("valid gradle pattern")
});

static ARCHIVE_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"archiveFileName\s*(?:=|\.set\s*\()\s*["']([^"']+)["']"#)
        .expect("valid gradle pattern")
});

static ARCHIVE_BASE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:archiveBaseName|archivesBaseName|baseName)\s*(?:=|\.set\s*\()\s*["']([^"']+)["']"#)
        .expect("valid gradle pattern")
});

static ROOT_PROJECT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"rootProject\.name\s*=\s*["']([^"']+)["']"#).expect("valid gradle pattern")
});

static WEB_APP_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"webAppDir(?:Name|ectory)?\s*(?:=|\.set\s*\()\s*(?:(?:file|layout\.projectDirectory\.dir)\s*\(\s*)?["']([^"']+)["']"#,
    )
    .expect("valid gradle pattern")
});

/// Values read from `build.gradle[.kts]` and `settings.gradle[.kts]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GradleDescriptor {
    /// `archiveFileName` with any `.war` suffix removed.
    pub archive_file_name: Option<String>,
    /// `archiveBaseName` (or the older `archivesBaseName`/`baseName`).
    pub archive_base_name: Option<String>,
    /// `rootProject.name` from the settings script.
    pub root_project_name: Option<String>,
    /// `webAppDirName` / `webAppDirectory`.
    pub web_app_dir: Option<String>,
}

/// Scan a build script and, when present, its settings script.
#[must_use]
pub fn parse_gradle(build_script: &str, settings_script: Option<&str>) -> GradleDescriptor {
    let build = COMMENTS.replace_all(build_script, "");
    let settings = settings_script.map(|s| COMMENTS.replace_all(s, "").to_string());

    let capture = |re: &Regex, text: &str| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let root_project_name = settings
        .as_deref()
        .and_then(|s| capture(&ROOT_PROJECT_NAME, s))
        .or_else(|| capture(&ROOT_PROJECT_NAME, &build));

    GradleDescriptor {
        archive_file_name: capture(&ARCHIVE_FILE_NAME, &build).map(|name| {
            name.strip_suffix(".war")
                .map_or_else(|| name.clone(), ToString::to_string)
        }),
        archive_base_name: capture(&ARCHIVE_BASE_NAME, &build),
        root_project_name,
        web_app_dir: capture(&WEB_APP_DIR, &build),
    }
}

impl GradleDescriptor {
    /// Build the layout for `root`, applying Gradle defaults for absent values.
    #[must_use]
    pub fn into_layout(self, root: &Path, descriptor: Option<PathBuf>) -> ProjectLayout {
        let web_root = self
            .web_app_dir
            .as_deref()
            .and_then(|dir| descriptor_path(dir, root))
            .unwrap_or_else(|| PathBuf::from("src/main/webapp"));

        let artifact_name = self
            .archive_file_name
            .or(self.archive_base_name)
            .or(self.root_project_name)
            .unwrap_or_else(|| directory_name(root));

        ProjectLayout {
            kind: LayoutKind::Gradle,
            root: root.to_path_buf(),
            compiled_output_root: PathBuf::from("build/classes/java/main"),
            source_roots: vec![PathBuf::from("src/main/java")],
            resource_roots: vec![PathBuf::from("src/main/resources")],
            web_resource_roots: vec![web_root],
            artifact_name,
            descriptor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_groovy_script() {
        let build = r"
plugins { id 'war' }
// archiveBaseName = 'commented'
war {
    archiveBaseName = 'store'
}
webAppDirName = 'web'
";
        let descriptor = parse_gradle(build, Some("rootProject.name = 'storefront'"));

        assert_eq!(descriptor.archive_base_name.as_deref(), Some("store"));
        assert_eq!(descriptor.root_project_name.as_deref(), Some("storefront"));
        assert_eq!(descriptor.web_app_dir.as_deref(), Some("web"));
    }

    #[test]
    fn test_parse_kotlin_script() {
        let build = r#"
tasks.war {
    archiveFileName.set("store.war")
    webAppDirectory.set(file("src/web"))
}
"#;
        let descriptor = parse_gradle(build, None);

        assert_eq!(descriptor.archive_file_name.as_deref(), Some("store"));
        assert_eq!(descriptor.web_app_dir.as_deref(), Some("src/web"));
    }

    #[test]
    fn test_block_comments_are_ignored() {
        let descriptor = parse_gradle("/* rootProject.name = 'x' */", None);
        assert_eq!(descriptor, GradleDescriptor::default());
    }

    #[test]
    fn test_into_layout_prefers_archive_file_name() {
        let descriptor = GradleDescriptor {
            archive_file_name: Some("a".to_string()),
            archive_base_name: Some("b".to_string()),
            root_project_name: Some("c".to_string()),
            web_app_dir: None,
        };
        let layout = descriptor.into_layout(Path::new("/work/app"), None);

        assert_eq!(layout.artifact_name, "a");
        assert_eq!(
            layout.compiled_output_root,
            PathBuf::from("build/classes/java/main")
        );
        assert_eq!(
            layout.web_resource_roots,
            vec![PathBuf::from("src/main/webapp")]
        );
    }

    #[test]
    fn test_into_layout_falls_back_to_directory_name() {
        let layout = GradleDescriptor::default().into_layout(Path::new("/work/app"), None);
        assert_eq!(layout.artifact_name, "app");
    }
}
