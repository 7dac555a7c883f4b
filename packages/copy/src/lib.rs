//! Target directory updates for smartdeploy.
//!
//! Everything that writes into a deployed webapp directory lives here:
//!
//! * Single-file overwrite used by the incremental watch channels
//! * Overlay copy of a directory (parallel, via `jwalk` and `rayon`)
//! * Reconciling sync that prunes stale entries outside protected directories
//! * `.war` extraction through `zip`
//!
//! Copies try `reflink-copy` first and fall back to a plain copy.
//!
//! # Example
//!
//! ```rust,ignore
//! use smartdeploy_copy::{sync_directory, CopyProgress};
//!
//! let protected = [PathBuf::from("WEB-INF/classes"), PathBuf::from("WEB-INF/lib")];
//! let result = sync_directory(web_root, target, &protected, |p: &CopyProgress| {
//!     println!("{}", p.summary());
//! })?;
//! ```

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

mod archive;
mod copy;
mod count;
mod error;
mod progress;
mod sync;

pub use archive::extract_archive;
pub use copy::{CopyResult, copy_directory, overwrite_file};
pub use count::count_files;
pub use error::CopyError;
pub use progress::{CopyPhase, CopyProgress, ProgressTracker};
pub use sync::{SyncResult, clear_directory, sync_directory};
