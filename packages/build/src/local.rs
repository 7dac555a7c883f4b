//! The local strategy: sync, compile, overlay.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use smartdeploy_config::DeployConfig;
use smartdeploy_copy::{
    CopyError, CopyProgress, CopyResult, copy_directory, overwrite_file, sync_directory,
};
use smartdeploy_mapping::{MappingOrigin, matching_files, resolve};

use crate::diagnostics::check_output;
use crate::error::BuildError;
use crate::runner::{CommandRunner, CommandSpec};
use crate::strategy::{BuildStrategy, Platform};

/// Target directories the reconciling sync never prunes.
pub const PROTECTED_DIRS: [&str; 2] = ["WEB-INF/classes", "WEB-INF/lib"];

fn log_progress(progress: &CopyProgress) {
    log::debug!("{}", progress.summary());
}

/// Every `.java` file under `roots`, sorted.
#[must_use]
pub fn collect_sources(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = roots
        .iter()
        .filter(|root| root.is_dir())
        .flat_map(|root| {
            jwalk::WalkDir::new(root)
                .skip_hidden(false)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "java"))
                .collect::<Vec<_>>()
        })
        .collect();
    sources.sort();
    sources
}

/// Classpath entries for the compiler, as `dir/*` wildcards.
///
/// The server's `lib`, the project's `lib`, and every `WEB-INF/lib` found in
/// a web root or the target, in that order. Missing directories are left out.
#[must_use]
pub fn classpath_entries(config: &DeployConfig, target: &Path) -> Vec<String> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Some(home) = &config.settings.server_home {
        dirs.push(config.layout.absolute(home).join("lib"));
    }
    dirs.push(config.project_root().join("lib"));
    for web_root in config.layout.web_roots_absolute() {
        dirs.push(web_root.join("WEB-INF/lib"));
    }
    dirs.push(target.join("WEB-INF/lib"));

    let mut entries: Vec<String> = Vec::new();
    for dir in dirs.into_iter().filter(|d| d.is_dir()) {
        let entry = dir.join("*").display().to_string();
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
    entries
}

/// Locate `javac`: `JAVA_HOME/bin` first, then `PATH`.
///
/// # Errors
///
/// * If neither location has it
pub fn find_javac(platform: Platform) -> Result<PathBuf, BuildError> {
    let tool = platform.tool_name(BuildStrategy::Local);
    if let Some(home) = std::env::var_os("JAVA_HOME") {
        let candidate = PathBuf::from(home).join("bin").join(tool);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    which::which(tool).map_err(|_| BuildError::ToolNotFound {
        tool: tool.to_string(),
    })
}

/// One quoted path per line, in the format `javac @file` reads.
#[must_use]
pub fn arg_file_contents(sources: &[PathBuf]) -> String {
    sources
        .iter()
        .map(|s| {
            let path = s.display().to_string().replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{path}\"\n")
        })
        .collect()
}

fn compile(
    config: &DeployConfig,
    target: &Path,
    javac: &Path,
    runner: &dyn CommandRunner,
    platform: Platform,
    sources: &[PathBuf],
) -> Result<(), BuildError> {
    let classes = target.join("WEB-INF/classes");
    fs::create_dir_all(&classes).map_err(|e| CopyError::CreateDirError {
        path: classes.clone(),
        io_error: e,
    })?;

    let mut arg_file = tempfile::Builder::new()
        .prefix("smartdeploy-javac-")
        .suffix(".args")
        .tempfile()
        .map_err(|source| BuildError::ArgFileError { source })?;
    arg_file
        .write_all(arg_file_contents(sources).as_bytes())
        .and_then(|()| arg_file.flush())
        .map_err(|source| BuildError::ArgFileError { source })?;

    let mut args = vec![
        "-encoding".to_string(),
        config.settings.encoding.clone(),
        "-g".to_string(),
        "-d".to_string(),
        classes.display().to_string(),
    ];
    let classpath = classpath_entries(config, target);
    if !classpath.is_empty() {
        args.push("-cp".to_string());
        args.push(classpath.join(platform.classpath_separator()));
    }
    args.push(format!("@{}", arg_file.path().display()));

    log::info!("Compiling {} sources", sources.len());
    let spec = CommandSpec::new(javac, args, config.project_root());
    let output = runner.run(&spec, config.build_timeout())?;
    check_output(BuildStrategy::Local, &spec, &output)
}

/// Copy every file selected by a `Local`-origin mapping into `target`.
///
/// Returns the number of files copied.
///
/// # Errors
///
/// * If a destination cannot be prepared or a copy fails
pub fn overlay_local_mappings(config: &DeployConfig, target: &Path) -> Result<u64, BuildError> {
    let root = config.project_root();
    let mut copied = 0;

    for mapping in config
        .compile()
        .iter()
        .filter(|m| m.mapping.origin == MappingOrigin::Local)
    {
        for file in matching_files(mapping, root) {
            let destination = resolve(mapping, &file, root, target)?;
            if let CopyResult::Created { files_copied } = overwrite_file(&file, &destination)? {
                copied += files_copied;
            }
        }
    }

    log::debug!("Local mappings copied {copied} files");
    Ok(copied)
}

/// Run the local strategy into `target`.
///
/// 1. Sync the first web root into `target`, pruning stale entries outside
///    [`PROTECTED_DIRS`]; further web roots are overlaid
/// 2. Overlay resource roots into `WEB-INF/classes`
/// 3. Compile every source with one `javac` call through an argument file
/// 4. Apply the `Local` mappings
///
/// # Arguments
///
/// * `config` - Loaded configuration
/// * `target` - Deployed application directory
/// * `javac` - Compiler to use, located on demand when `None`
/// * `runner` - Runs the compiler
/// * `platform` - Host platform
///
/// # Errors
///
/// * If a sync or copy fails
/// * If `javac` cannot be found or reports errors
pub fn build_local(
    config: &DeployConfig,
    target: &Path,
    javac: Option<&Path>,
    runner: &dyn CommandRunner,
    platform: Platform,
) -> Result<(), BuildError> {
    let protected: Vec<PathBuf> = PROTECTED_DIRS.iter().map(PathBuf::from).collect();

    let web_roots = config.layout.web_roots_absolute();
    match web_roots.split_first() {
        Some((first, rest)) => {
            let result = sync_directory(first, target, &protected, log_progress)?;
            log::info!(
                "Synced {}: {} copied, {} unchanged, {} removed",
                first.display(),
                result.files_copied,
                result.files_unchanged,
                result.entries_removed
            );
            for web_root in rest {
                copy_directory(web_root, target, log_progress)?;
            }
        }
        None => log::debug!("No web roots to sync"),
    }

    let classes = target.join("WEB-INF/classes");
    for resource_root in config.layout.resource_roots_absolute() {
        copy_directory(&resource_root, &classes, log_progress)?;
    }

    let sources = collect_sources(&config.layout.source_roots_absolute());
    if sources.is_empty() {
        log::info!("No Java sources to compile");
    } else {
        let javac = match javac {
            Some(path) => path.to_path_buf(),
            None => find_javac(platform)?,
        };
        compile(config, target, &javac, runner, platform, &sources)?;
    }

    overlay_local_mappings(config, target)?;
    Ok(())
}
