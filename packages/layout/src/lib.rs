//! Project layout detection for smartdeploy.
//!
//! Classifies a workspace root as a Maven, Gradle, Eclipse or plain project and
//! derives the roots the rest of the engine works from:
//!
//! * Compiled output root (where `.class` files appear)
//! * Source roots (where `.java` files live)
//! * Resource roots (copied next to compiled classes)
//! * Web resource roots (the exploded web application sources)
//! * Artifact name (the deployed context name)
//!
//! Detection never fails. A descriptor that is missing or unreadable falls back
//! to the documented defaults, and an unrecognized project is a plain layout.
//!
//! # Example
//!
//! ```rust,ignore
//! use smartdeploy_layout::detect;
//!
//! let layout = detect(Path::new("/path/to/project"));
//! println!("{} project, classes in {}", layout.kind, layout.compiled_output_root.display());
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod detect;
mod eclipse;
mod gradle;
mod maven;
mod types;
mod xml;

pub use detect::detect;
pub use eclipse::{EclipseDescriptor, parse_classpath, parse_component};
pub use gradle::{GradleDescriptor, parse_gradle};
pub use maven::{MavenDescriptor, parse_pom};
pub use types::{LayoutKind, ProjectLayout};
