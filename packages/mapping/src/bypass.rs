//! Copy-marker and scratch-file filtering.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Default bypass rules: file-manager "copy of" names in several languages.
pub const DEFAULT_BYPASS_PATTERNS: &str = "* - Copy*,Copy of *,* copy.*,* copy,* copy [0-9]*,\
* - Kopie*,Kopie von *,* - Copie*,Copie de *,* - Copia*,Copia di *,Copia de *,\
* - Kopia*,* - コピー*,*のコピー*,* - 副本*,*副本*";

const TRANSIENT_SUFFIXES: [&str; 11] = [
    "~",
    ".swp",
    ".swo",
    ".swx",
    ".tmp",
    ".temp",
    ".part",
    ".crdownload",
    ".orig",
    "___jb_tmp___",
    "___jb_old___",
];

/// Whether `file_name` is a hidden, backup or editor scratch file.
#[must_use]
pub fn is_transient(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    file_name.starts_with('.')
        || (file_name.starts_with('#') && file_name.ends_with('#'))
        || file_name == "4913"
        || TRANSIENT_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Case-insensitive file-name globs that exclude files from deployment.
#[derive(Debug, Clone)]
pub struct BypassFilter {
    set: GlobSet,
    patterns: Vec<String>,
    rejected: Vec<(String, String)>,
}

impl BypassFilter {
    /// Build a filter from a comma-separated pattern list.
    ///
    /// Patterns that fail to parse are skipped and kept in
    /// [`BypassFilter::rejected`].
    #[must_use]
    pub fn new(list: &str) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut patterns = Vec::new();
        let mut rejected = Vec::new();

        for pattern in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match GlobBuilder::new(pattern).case_insensitive(true).build() {
                Ok(glob) => {
                    builder.add(glob);
                    patterns.push(pattern.to_string());
                }
                Err(e) => {
                    log::warn!("Ignoring bypass pattern {pattern:?}: {e}");
                    rejected.push((pattern.to_string(), e.to_string()));
                }
            }
        }

        let set = builder.build().unwrap_or_else(|e| {
            log::warn!("Failed to build bypass filter: {e}");
            GlobSet::empty()
        });

        Self {
            set,
            patterns,
            rejected,
        }
    }

    /// Whether `file_name` matches a bypass rule.
    #[must_use]
    pub fn is_bypassed(&self, file_name: &str) -> bool {
        self.set.is_match(file_name)
    }

    /// Accepted patterns.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Patterns that failed to parse, with the parser's message.
    #[must_use]
    pub fn rejected(&self) -> &[(String, String)] {
        &self.rejected
    }
}

impl Default for BypassFilter {
    fn default() -> Self {
        Self::new(DEFAULT_BYPASS_PATTERNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_matches_copy_markers() {
        let filter = BypassFilter::default();

        assert!(filter.is_bypassed("index - Copy.jsp"));
        assert!(filter.is_bypassed("index - copy (2).jsp"));
        assert!(filter.is_bypassed("Copy of site.css"));
        assert!(filter.is_bypassed("site copy.css"));
        assert!(filter.is_bypassed("site copy 2.css"));
        assert!(filter.is_bypassed("logo - Kopie.png"));
        assert!(filter.is_bypassed("Copie de app.js"));
        assert!(filter.is_bypassed("app - コピー.js"));
        assert!(!filter.is_bypassed("copyright.txt"));
        assert!(!filter.is_bypassed("index.jsp"));
        assert!(filter.rejected().is_empty());
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        let filter = BypassFilter::new("*.bak, [oops ,");

        assert_eq!(filter.patterns(), ["*.bak".to_string()]);
        assert_eq!(filter.rejected().len(), 1);
        assert!(filter.is_bypassed("A.BAK"));
    }

    #[test]
    fn test_is_transient() {
        assert!(is_transient(".Foo.java.swp"));
        assert!(is_transient("Foo.java~"));
        assert!(is_transient("#Foo.java#"));
        assert!(is_transient("Foo.java___jb_tmp___"));
        assert!(is_transient("download.CRDOWNLOAD"));
        assert!(!is_transient("Foo.java"));
    }
}
