//! Mappings generated from a detected layout.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::Path;

use smartdeploy_layout::{LayoutKind, ProjectLayout};

use crate::types::{Mapping, MappingOrigin};

fn glob_root(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .trim_end_matches('/')
        .to_string()
}

fn under(root: &str, rest: &str) -> String {
    if root.is_empty() || root == "." {
        rest.to_string()
    } else {
        format!("{root}/{rest}")
    }
}

/// Default mappings for `layout`, in priority order.
///
/// * Compiled classes into `WEB-INF/classes`
/// * Resource roots into `WEB-INF/classes`
/// * Web resource roots onto the application root
/// * Eclipse and plain projects: non-Java files under source roots into
///   `WEB-INF/classes`
/// * Plain projects: `lib/*.jar` into `WEB-INF/lib`
#[must_use]
pub fn generated_mappings(layout: &ProjectLayout) -> Vec<Mapping> {
    let mut mappings = vec![
        Mapping::new(
            under(&glob_root(&layout.compiled_output_root), "**/*.class"),
            "WEB-INF/classes/{relative}",
            MappingOrigin::Smart,
        )
        .including(&[".class"])
        .with_reload(true)
        .with_description("compiled classes"),
    ];

    for root in &layout.resource_roots {
        mappings.push(
            Mapping::new(
                under(&glob_root(root), "**/*"),
                "WEB-INF/classes/{relative}",
                MappingOrigin::Smart,
            )
            .with_description(format!("resources from {}", glob_root(root))),
        );
    }

    for root in &layout.web_resource_roots {
        mappings.push(
            Mapping::new(
                under(&glob_root(root), "**/*"),
                "{relative}",
                MappingOrigin::Smart,
            )
            .with_description(format!("web resources from {}", glob_root(root))),
        );
    }

    if matches!(layout.kind, LayoutKind::Eclipse | LayoutKind::Plain) {
        for root in &layout.source_roots {
            mappings.push(
                Mapping::new(
                    under(&glob_root(root), "**/*"),
                    "WEB-INF/classes/{relative}",
                    MappingOrigin::Smart,
                )
                .excluding(&[".java"])
                .with_description(format!("classpath resources from {}", glob_root(root))),
            );
        }
    }

    if layout.kind == LayoutKind::Plain {
        mappings.push(
            Mapping::new("lib/**/*.jar", "WEB-INF/lib/{relative}", MappingOrigin::Smart)
                .with_reload(true)
                .with_description("libraries"),
        );
    }

    mappings
}
