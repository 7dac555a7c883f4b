//! The Maven and Gradle strategies.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use smartdeploy_config::DeployConfig;
use smartdeploy_copy::{
    CopyProgress, CopyResult, clear_directory, copy_directory, extract_archive,
};

use crate::diagnostics::check_output;
use crate::error::BuildError;
use crate::runner::{CommandRunner, CommandSpec};
use crate::strategy::{BuildStrategy, Platform};

/// What a delegated build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// A `.war` archive.
    Archive(PathBuf),
    /// An exploded webapp directory.
    Exploded(PathBuf),
}

impl Artifact {
    /// Location of the artifact.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Archive(path) | Self::Exploded(path) => path,
        }
    }
}

/// Locate the build tool: project wrapper first, then `PATH`.
///
/// # Errors
///
/// * If neither exists
pub fn find_build_tool(
    strategy: BuildStrategy,
    project_root: &Path,
    platform: Platform,
) -> Result<PathBuf, BuildError> {
    if let Some(wrapper) = platform.wrapper_script(strategy) {
        let candidate = project_root.join(wrapper);
        if candidate.is_file() {
            log::debug!("Using wrapper {}", candidate.display());
            return Ok(candidate);
        }
    }

    let tool = platform.tool_name(strategy);
    which::which(tool).map_err(|_| BuildError::ToolNotFound {
        tool: tool.to_string(),
    })
}

fn modified(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Find the artifact a delegated build left behind.
///
/// An archive named after the artifact wins, then the newest archive, then
/// the exploded directory.
///
/// # Errors
///
/// * If nothing is found
pub fn locate_artifact(
    strategy: BuildStrategy,
    project_root: &Path,
    artifact_name: &str,
) -> Result<Artifact, BuildError> {
    let mut searched = Vec::new();
    let mut archives: Vec<PathBuf> = Vec::new();

    for pattern in strategy.archive_globs() {
        let full_pattern = project_root.join(pattern).to_string_lossy().to_string();
        searched.push(full_pattern.clone());
        match glob::glob(&full_pattern) {
            Ok(paths) => archives.extend(paths.filter_map(Result::ok).filter(|p| p.is_file())),
            Err(e) => log::warn!("Invalid artifact pattern {full_pattern}: {e}"),
        }
    }

    let named = archives
        .iter()
        .find(|p| p.file_stem().is_some_and(|stem| stem == artifact_name));
    if let Some(archive) = named {
        return Ok(Artifact::Archive(archive.clone()));
    }
    if let Some(newest) = archives.iter().max_by_key(|p| modified(p)) {
        return Ok(Artifact::Archive(newest.clone()));
    }

    if let Some(exploded) = strategy.exploded_dir(artifact_name) {
        let exploded = project_root.join(exploded);
        searched.push(exploded.display().to_string());
        if exploded.is_dir() {
            return Ok(Artifact::Exploded(exploded));
        }
    }

    Err(BuildError::ArtifactNotFound { searched })
}

/// Replace the contents of `target` with `artifact`.
///
/// # Errors
///
/// * If clearing, extracting or copying fails
pub fn deploy_artifact(artifact: &Artifact, target: &Path) -> Result<u64, BuildError> {
    let progress = |p: &CopyProgress| log::debug!("{}", p.summary());

    clear_directory(target)?;
    let files = match artifact {
        Artifact::Archive(archive) => extract_archive(archive, target, progress)?,
        Artifact::Exploded(dir) => match copy_directory(dir, target, progress)? {
            CopyResult::Created { files_copied } => files_copied,
            CopyResult::SourceNotFound => 0,
        },
    };

    log::info!(
        "Deployed {} files from {}",
        files,
        artifact.path().display()
    );
    Ok(files)
}

/// Run the Maven or Gradle strategy into `target`.
///
/// # Errors
///
/// * If the tool is missing, fails or times out
/// * If no artifact is produced
/// * If the target cannot be replaced
pub fn build_delegated(
    strategy: BuildStrategy,
    config: &DeployConfig,
    target: &Path,
    runner: &dyn CommandRunner,
    platform: Platform,
) -> Result<Artifact, BuildError> {
    let root = config.project_root();
    let tool = find_build_tool(strategy, root, platform)?;
    let args = strategy
        .tool_args()
        .iter()
        .map(ToString::to_string)
        .collect();

    let spec = CommandSpec::new(tool, args, root);
    let output = runner.run(&spec, config.build_timeout())?;
    check_output(strategy, &spec, &output)?;

    let artifact = locate_artifact(strategy, root, config.artifact_name())?;
    deploy_artifact(&artifact, target)?;
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_locate_prefers_named_archive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/shop.war"), "").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        fs::write(dir.path().join("target/other.war"), "").unwrap();

        let artifact = locate_artifact(BuildStrategy::Maven, dir.path(), "shop").unwrap();

        assert_eq!(artifact, Artifact::Archive(dir.path().join("target/shop.war")));
    }

    #[test]
    fn test_locate_falls_back_to_exploded_dir() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("target/shop/WEB-INF")).unwrap();

        let artifact = locate_artifact(BuildStrategy::Maven, dir.path(), "shop").unwrap();

        assert_eq!(artifact, Artifact::Exploded(dir.path().join("target/shop")));
    }

    #[test]
    fn test_locate_reports_searched_locations() {
        let dir = TempDir::new().unwrap();

        let err = locate_artifact(BuildStrategy::Gradle, dir.path(), "shop").unwrap_err();

        let BuildError::ArtifactNotFound { searched } = err else {
            panic!("unexpected error");
        };
        assert_eq!(searched.len(), 2);
        assert!(searched[0].ends_with("build/libs/*.war"));
    }

    #[test]
    fn test_find_build_tool_prefers_wrapper() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("gradlew"), "#!/bin/sh").unwrap();

        let tool = find_build_tool(BuildStrategy::Gradle, dir.path(), Platform::Unix).unwrap();

        assert_eq!(tool, dir.path().join("gradlew"));
    }

    #[test]
    fn test_deploy_artifact_replaces_target() {
        let dir = TempDir::new().unwrap();
        let exploded = dir.path().join("target/shop");
        fs::create_dir_all(&exploded).unwrap();
        fs::write(exploded.join("index.jsp"), "new").unwrap();
        let target = dir.path().join("deploy");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("stale.jsp"), "old").unwrap();

        let files = deploy_artifact(&Artifact::Exploded(exploded), &target).unwrap();

        assert_eq!(files, 1);
        assert!(!target.join("stale.jsp").exists());
        assert_eq!(fs::read_to_string(target.join("index.jsp")).unwrap(), "new");
    }
}
