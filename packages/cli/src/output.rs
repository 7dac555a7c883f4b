//! Terminal output formatting.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use colored::Colorize;
use smartdeploy_events::{DeployEvent, DeployEvents};
use smartdeploy_layout::ProjectLayout;
use smartdeploy_mapping::CompiledMapping;

/// Print a header message.
pub fn print_header(message: &str) {
    println!("\n{} {}\n", "🚀", message.bold());
}

/// Print project info.
pub fn print_project_info(root: &Path) {
    println!("Project: {}", root.display().to_string().cyan());
}

fn print_field(label: &str, value: &str) {
    println!("  {:<18} {}", format!("{label}:").dimmed(), value);
}

fn join_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "-".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print a detected layout.
pub fn print_layout(layout: &ProjectLayout, deploy_target: Option<&Path>) {
    print_field("Type", &layout.kind.to_string().yellow().to_string());
    print_field("Artifact", &layout.artifact_name);
    print_field(
        "Descriptor",
        &layout
            .descriptor
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.display().to_string()),
    );
    print_field("Output", &layout.compiled_output_root.display().to_string());
    print_field("Sources", &join_paths(&layout.source_roots));
    print_field("Resources", &join_paths(&layout.resource_roots));
    print_field("Web resources", &join_paths(&layout.web_resource_roots));
    print_field(
        "Deploy target",
        &deploy_target.map_or_else(
            || "not configured".dimmed().to_string(),
            |p| p.display().to_string(),
        ),
    );
}

/// Print the compiled mappings with their matcher sources.
pub fn print_mapping_list(mappings: &[CompiledMapping]) {
    println!(
        "Found {} mapping{}:",
        mappings.len(),
        if mappings.len() == 1 { "" } else { "s" }
    );
    for compiled in mappings {
        let mapping = &compiled.mapping;
        let reload = if mapping.triggers_reload { " (reload)" } else { "" };
        println!(
            "  {} [{}] {} -> {}{}",
            "•".dimmed(),
            mapping.origin,
            mapping.source.yellow(),
            mapping.destination,
            reload.dimmed()
        );
        if !mapping.description.is_empty() {
            println!("      {}", mapping.description);
        }
        println!("      {}", compiled.matcher_source().dimmed());
        if let Some(diagnostic) = compiled.diagnostic() {
            println!("      {} {}", "never matches:".yellow(), diagnostic);
        }
    }
    println!();
}

/// Print a result line with a checkmark.
pub fn print_result(label: &str, result: &str) {
    println!("{} {:<30} {}", "✓".green(), label, result.dimmed());
}

/// Print success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✅", message);
}

/// Print error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "Warning:".yellow().bold(), message);
}

/// Prints events as colored text lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleEvents;

impl DeployEvents for ConsoleEvents {
    fn emit(&self, event: DeployEvent) {
        match &event {
            DeployEvent::BuildFailed { diagnostics } => {
                eprintln!("{} build failed", "✗".red().bold());
                for line in diagnostics {
                    eprintln!("    {line}");
                }
            }
            DeployEvent::ConfigReloadFailed { .. } => {
                eprintln!("{} {}", "✗".red().bold(), event);
            }
            DeployEvent::WatchRootSkipped { .. }
            | DeployEvent::PatternRejected { .. }
            | DeployEvent::BuildRetry { .. }
            | DeployEvent::BuildIgnored { .. } => print_warning(&event.to_string()),
            DeployEvent::MappingMatched { source, .. } => print_result(source, "deployed"),
            DeployEvent::DeleteIgnored { .. }
            | DeployEvent::RescanMatched { .. } => log::debug!("{event}"),
            _ => println!("{} {}", "•".dimmed(), event),
        }
    }
}

/// Prints every event as one JSON line on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonEvents;

impl DeployEvents for JsonEvents {
    fn emit(&self, event: DeployEvent) {
        println!("{}", event.to_json());
    }
}
