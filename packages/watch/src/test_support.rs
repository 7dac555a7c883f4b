//! Fixtures shared by the scheduler tests.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use smartdeploy_config::{DEFAULT_MAPPING_FILE, DeployConfig, SETTINGS_FILE, Settings};
use smartdeploy_layout::{LayoutKind, ProjectLayout};

use crate::snapshot::WatchSnapshot;

/// Snapshot of a Maven project at `root` deploying into `root/deploy`, with
/// short timings.
pub fn snapshot(root: &Path) -> WatchSnapshot {
    let layout = ProjectLayout {
        kind: LayoutKind::Maven,
        root: root.to_path_buf(),
        compiled_output_root: PathBuf::from("target/classes"),
        source_roots: vec![PathBuf::from("src/main/java")],
        resource_roots: vec![PathBuf::from("src/main/resources")],
        web_resource_roots: vec![PathBuf::from("src/main/webapp")],
        artifact_name: "shop".to_string(),
        descriptor: None,
    };
    let config = DeployConfig::from_parts(
        layout,
        Settings::default(),
        Vec::new(),
        root.join(DEFAULT_MAPPING_FILE),
        root.join(SETTINGS_FILE),
    );

    let mut snapshot = WatchSnapshot::from_config(&config, &root.join("deploy"));
    snapshot.debounce_window = Duration::from_millis(50);
    snapshot.rescan_delays = [10, 30, 60].map(Duration::from_millis).to_vec();
    snapshot
}

/// Poll `condition` for up to five seconds.
pub fn wait_for<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}
