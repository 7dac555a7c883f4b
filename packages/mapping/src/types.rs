//! Mapping data.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Where a mapping came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingOrigin {
    /// Generated from the detected project layout.
    Smart,
    /// Supplied by the user's mapping file.
    Local,
}

impl std::fmt::Display for MappingOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Smart => write!(f, "smart"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// A glob over project-relative paths paired with a destination template.
///
/// The destination is relative to the deployed application root and may
/// contain one `{relative}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// Source glob, `/`-separated, relative to the project root.
    pub source: String,
    /// Destination template.
    pub destination: String,
    /// Whether a deploy through this mapping warrants a server reload.
    pub triggers_reload: bool,
    /// Only files with one of these extensions match, when set.
    pub include_extensions: Option<Vec<String>>,
    /// Files with one of these extensions never match.
    pub exclude_extensions: Option<Vec<String>>,
    /// Human-readable description.
    pub description: String,
    /// Where the mapping came from.
    pub origin: MappingOrigin,
    /// Disabled mappings are dropped at compile time.
    pub enabled: bool,
}

impl Mapping {
    /// Create an enabled mapping with no extension filters.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        origin: MappingOrigin,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            triggers_reload: false,
            include_extensions: None,
            exclude_extensions: None,
            description: String::new(),
            origin,
            enabled: true,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set whether the mapping triggers a reload.
    #[must_use]
    pub const fn with_reload(mut self, triggers_reload: bool) -> Self {
        self.triggers_reload = triggers_reload;
        self
    }

    /// Restrict matches to the given extensions.
    #[must_use]
    pub fn including(mut self, extensions: &[&str]) -> Self {
        self.include_extensions = Some(extensions.iter().map(ToString::to_string).collect());
        self
    }

    /// Exclude the given extensions.
    #[must_use]
    pub fn excluding(mut self, extensions: &[&str]) -> Self {
        self.exclude_extensions = Some(extensions.iter().map(ToString::to_string).collect());
        self
    }

    /// The `(source, destination)` key used to de-duplicate mappings.
    #[must_use]
    pub fn key(&self) -> (String, String) {
        (self.source.clone(), self.destination.clone())
    }

    /// Whether the extension filters accept `relative`.
    ///
    /// Extensions compare case-insensitively with or without the leading dot.
    #[must_use]
    pub fn accepts_extension(&self, relative: &str) -> bool {
        let name = relative.rsplit(['/', '\\']).next().unwrap_or(relative);
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let listed = |list: &[String]| {
            list.iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&extension))
        };

        if let Some(include) = &self.include_extensions {
            if !include.is_empty() && !listed(include) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude_extensions {
            if listed(exclude) {
                return false;
            }
        }
        true
    }
}

impl std::fmt::Display for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.description.is_empty() {
            write!(f, "{} -> {}", self.source, self.destination)
        } else {
            f.write_str(&self.description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_extensions_never_match_other_extensions() {
        let mapping = Mapping::new("target/classes/**/*", "WEB-INF/classes/{relative}", MappingOrigin::Smart)
            .including(&[".class"]);

        assert!(mapping.accepts_extension("target/classes/Foo.class"));
        assert!(mapping.accepts_extension("target/classes/Foo.CLASS"));
        assert!(!mapping.accepts_extension("target/classes/Foo.java"));
        assert!(!mapping.accepts_extension("target/classes/README"));
    }

    #[test]
    fn test_exclude_extensions() {
        let mapping =
            Mapping::new("src/**/*", "WEB-INF/classes/{relative}", MappingOrigin::Smart)
                .excluding(&["java"]);

        assert!(!mapping.accepts_extension("src/a/Foo.java"));
        assert!(mapping.accepts_extension("src/a/messages.properties"));
    }

    #[test]
    fn test_display_prefers_description() {
        let mapping = Mapping::new("a/*", "b/{relative}", MappingOrigin::Local);
        assert_eq!(mapping.to_string(), "a/* -> b/{relative}");
        assert_eq!(mapping.with_description("assets").to_string(), "assets");
    }
}
