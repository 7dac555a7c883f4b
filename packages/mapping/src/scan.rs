//! Enumerating files a mapping selects.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::{Path, PathBuf};

use crate::compile::CompiledMapping;
use crate::resolve::relative_path;

/// Every file under `project_root` that `mapping` accepts, sorted.
///
/// Only the mapping's literal prefix directory is walked. Refused and
/// disabled mappings select nothing.
#[must_use]
pub fn matching_files(mapping: &CompiledMapping, project_root: &Path) -> Vec<PathBuf> {
    if mapping.diagnostic().is_some() || !mapping.mapping.enabled {
        return Vec::new();
    }

    let base = project_root.join(mapping.segments.base_directory());
    if !base.is_dir() {
        log::debug!("Mapping base {} does not exist", base.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = jwalk::WalkDir::new(&base)
        .skip_hidden(false)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path())
        .filter(|path| {
            relative_path(path, project_root).is_some_and(|relative| mapping.matches(&relative))
        })
        .collect();

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Mapping, MappingOrigin};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_matching_files_walks_prefix_only() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("conf/dev")).unwrap();
        fs::create_dir_all(dir.path().join("other")).unwrap();
        fs::write(dir.path().join("conf/a.xml"), "").unwrap();
        fs::write(dir.path().join("conf/dev/b.xml"), "").unwrap();
        fs::write(dir.path().join("conf/dev/c.txt"), "").unwrap();
        fs::write(dir.path().join("other/d.xml"), "").unwrap();

        let mapping = CompiledMapping::new(Mapping::new(
            "conf/**/*.xml",
            "WEB-INF/{relative}",
            MappingOrigin::Local,
        ));

        let files = matching_files(&mapping, dir.path());

        assert_eq!(
            files,
            vec![dir.path().join("conf/a.xml"), dir.path().join("conf/dev/b.xml")]
        );
    }

    #[test]
    fn test_missing_base_selects_nothing() {
        let dir = TempDir::new().unwrap();
        let mapping = CompiledMapping::new(Mapping::new("web/**/*", "{relative}", MappingOrigin::Smart));

        assert!(matching_files(&mapping, dir.path()).is_empty());
    }
}
