//! smartdeploy CLI entry point.
//!
//! Watches a servlet webapp project and copies each change into the
//! deployed webapp, or runs a full build into it.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod args;
mod output;
mod progress;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;

use clap::Parser;

use args::{Args, Command};
use output::{ConsoleEvents, JsonEvents};
use progress::ProgressManager;
use smartdeploy_build::{
    BuildError, BuildExecutor, BuildOutcome, BuildStrategy, DetachedServer, PatternTerminator,
    Platform, SystemRunner,
};
use smartdeploy_config::{
    DeployConfig, StrategyPreference, canonical_path, find_project_root, starter_mapping_file,
    write_mapping_file,
};
use smartdeploy_events::DeployEvents;
use smartdeploy_watch::{ConfigReloader, WatchSnapshot, watch};

fn main() {
    let args = Args::parse();

    // Set up logging
    if args.verbose {
        // SAFETY: We're setting this before any other threads are spawned
        unsafe {
            env::set_var("RUST_LOG", "debug");
        }
    }
    pretty_env_logger::init();

    if let Err(e) = run(&args) {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let root = project_root(args)?;
    let events: Arc<dyn DeployEvents> = if args.json {
        Arc::new(JsonEvents)
    } else {
        Arc::new(ConsoleEvents)
    };

    match &args.command {
        Command::Detect => detect(&root),
        Command::Mappings => mappings(&root),
        Command::Init => init(&root),
        Command::Watch { target } => run_watch(&root, target.as_deref(), args, events),
        Command::Deploy { strategy, target } => {
            deploy(&root, *strategy, target.as_deref(), args, events)
        }
    }
}

/// Resolve the project root from `--project` or the working directory.
fn project_root(args: &Args) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let cwd = env::current_dir()?;
    let start = match &args.project {
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => cwd.join(path),
        None => cwd,
    };
    if !start.is_dir() {
        return Err(format!("Project directory does not exist: {}", start.display()).into());
    }
    Ok(find_project_root(&canonical_path(&start)))
}

/// The deployed webapp: the `--target` flag, else the configured target.
fn deploy_target(config: &DeployConfig, target: Option<&Path>) -> Result<PathBuf, BuildError> {
    match target {
        Some(path) => Ok(config.layout.absolute(path)),
        None => config.deploy_target().ok_or(BuildError::NoDeployTarget),
    }
}

fn detect(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = DeployConfig::load(root)?;

    output::print_header("Project Layout");
    output::print_project_info(root);
    output::print_layout(&config.layout, config.deploy_target().as_deref());
    Ok(())
}

fn mappings(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = DeployConfig::load(root)?;

    output::print_header("Mappings");
    output::print_project_info(root);
    println!("Mapping file: {}\n", config.mapping_file.display());
    output::print_mapping_list(&config.compile());

    for (pattern, reason) in config.bypass_filter().rejected() {
        output::print_warning(&format!("Bypass pattern '{pattern}' ignored: {reason}"));
    }
    Ok(())
}

fn init(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = DeployConfig::load(root)?;
    let starter = starter_mapping_file(&config.layout);

    if write_mapping_file(&config.mapping_file, &starter)? {
        output::print_success(&format!(
            "Created {} (every example starts disabled)",
            config.mapping_file.display()
        ));
    } else {
        output::print_warning(&format!(
            "{} already exists, leaving it untouched",
            config.mapping_file.display()
        ));
    }
    Ok(())
}

fn run_watch(
    root: &Path,
    target: Option<&Path>,
    args: &Args,
    events: Arc<dyn DeployEvents>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = DeployConfig::load(root)?;
    let webapp = deploy_target(&config, target)?;

    if !args.json {
        output::print_header("Watching");
        output::print_project_info(root);
        println!("Deploying to {}\n", webapp.display());
    }

    let snapshot = WatchSnapshot::from_config(&config, &webapp);
    let reloader = ConfigReloader::new(root, &webapp);
    let handle = watch(snapshot, Some(Box::new(reloader)), events)?;

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;
    rx.recv()?;

    log::info!("Interrupted, stopping watchers");
    handle.stop();
    Ok(())
}

fn deploy(
    root: &Path,
    preference: Option<StrategyPreference>,
    target: Option<&Path>,
    args: &Args,
    events: Arc<dyn DeployEvents>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = DeployConfig::load(root)?;
    let target = deploy_target(&config, target)?;
    let preference = preference.unwrap_or(config.settings.build_strategy);
    let strategy = BuildStrategy::select(preference, config.layout.kind);

    let platform = Platform::current();
    let runner = Arc::new(SystemRunner);
    let terminator = PatternTerminator::new(
        platform,
        &config.settings.lock_holder_pattern,
        root,
        runner.clone(),
    );
    let executor = BuildExecutor::new(
        runner,
        Arc::new(terminator),
        Arc::new(DetachedServer),
        events,
    )
    .with_platform(platform);

    let progress_mgr = ProgressManager::new(args.should_show_progress());
    let spinner = progress_mgr.create_build_spinner(&format!("{strategy} build"));
    spinner.set_message(target.display().to_string());

    let outcome = executor.execute_into(&config, strategy, &target);
    spinner.finish_and_clear();

    match outcome? {
        BuildOutcome::Deployed {
            target,
            files,
            attempts,
        } => {
            if !args.json {
                let result = if attempts == 1 {
                    "deployed".to_string()
                } else {
                    format!("deployed after {attempts} attempts")
                };
                progress_mgr.print_result_with_count(&target.display().to_string(), &result, files);
            }
        }
        BuildOutcome::Ignored => output::print_warning("A build is already running"),
    }
    Ok(())
}
