//! Glob translation.
//!
//! Patterns use three wildcards over `/`-separated relative paths:
//!
//! * `**` matches any run of characters, separators included. A `**/`
//!   segment also matches zero directories.
//! * `*` matches a run of characters within one segment.
//! * `?` matches one character within one segment.
//!
//! Every other character is literal. Separators match either `/` or `\`.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use regex::Regex;

const SEPARATOR: &str = r"[/\\]";
const NOT_SEPARATOR: &str = r"[^/\\]";

/// Translate a glob into anchored regular expression source.
///
/// The translation is a pure function of the pattern, so compiling the same
/// pattern twice yields identical source.
#[must_use]
pub fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if matches!(chars.get(i + 2), Some('/' | '\\')) {
                    out.push_str("(?:.*");
                    out.push_str(SEPARATOR);
                    out.push_str(")?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => {
                out.push_str(NOT_SEPARATOR);
                out.push('*');
            }
            '?' => out.push_str(NOT_SEPARATOR),
            '/' | '\\' => out.push_str(SEPARATOR),
            c => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
        }
        i += 1;
    }

    out.push('$');
    out
}

/// Reason a pattern is refused before translation, if any.
fn validate(pattern: &str) -> Option<String> {
    if pattern.trim().is_empty() {
        return Some("pattern is empty".to_string());
    }
    if pattern.starts_with(['/', '\\']) || pattern.chars().nth(1) == Some(':') {
        return Some("pattern must be relative to the project root".to_string());
    }
    if pattern.split(['/', '\\']).any(|segment| segment == "..") {
        return Some("pattern must not contain '..' segments".to_string());
    }
    if pattern.contains("***") {
        return Some("pattern contains a run of three or more '*'".to_string());
    }
    if pattern.chars().any(char::is_control) {
        return Some("pattern contains a control character".to_string());
    }
    None
}

/// Compiled matcher for one source pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Anchored regular expression over relative paths.
    Pattern(Regex),
    /// The pattern was refused. Matches nothing.
    Never {
        /// Why the pattern was refused.
        diagnostic: String,
    },
}

impl Matcher {
    /// Compile `pattern`. Never fails; refused patterns yield [`Matcher::Never`].
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        if let Some(diagnostic) = validate(pattern) {
            return Self::Never { diagnostic };
        }
        match Regex::new(&glob_to_regex(pattern)) {
            Ok(regex) => Self::Pattern(regex),
            Err(e) => Self::Never {
                diagnostic: e.to_string(),
            },
        }
    }

    /// Whether `relative` matches.
    #[must_use]
    pub fn is_match(&self, relative: &str) -> bool {
        match self {
            Self::Pattern(regex) => regex.is_match(relative),
            Self::Never { .. } => false,
        }
    }

    /// Regular expression source, empty for refused patterns.
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Pattern(regex) => regex.as_str(),
            Self::Never { .. } => "",
        }
    }

    /// Diagnostic for refused patterns.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Pattern(_) => None,
            Self::Never { diagnostic } => Some(diagnostic),
        }
    }
}

/// How the relative portion of a matched path is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternShape {
    /// `prefix/**/*...`: everything after the prefix.
    RecursiveAny,
    /// `prefix/**/suffix`: directories between prefix and suffix, then the
    /// base name.
    RecursiveSuffix {
        /// Number of path segments in the suffix.
        suffix_segments: usize,
    },
    /// Wildcards without `**`: everything after the directory part.
    SingleLevel,
    /// No wildcards.
    Literal,
}

/// Raw segments of a source pattern kept for destination templating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSegments {
    /// Literal directory part before the first wildcard, with its trailing
    /// `/` (empty when the pattern starts with a wildcard).
    pub literal_prefix: String,
    /// Extraction rule.
    pub shape: PatternShape,
}

impl PatternSegments {
    /// Split `pattern` into its literal prefix and extraction rule.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.replace('\\', "/");
        let first_wildcard = pattern.find(['*', '?']);

        let literal_end = first_wildcard.unwrap_or(pattern.len());
        let literal_prefix = pattern[..literal_end]
            .rfind('/')
            .map_or_else(String::new, |slash| pattern[..=slash].to_string());

        let shape = match pattern.find("**/") {
            Some(_) if pattern.contains("**/*") => PatternShape::RecursiveAny,
            Some(at) => PatternShape::RecursiveSuffix {
                suffix_segments: pattern[at + 3..].split('/').count(),
            },
            None if pattern.contains("**") => PatternShape::RecursiveAny,
            None if first_wildcard.is_some() => PatternShape::SingleLevel,
            None => PatternShape::Literal,
        };

        Self {
            literal_prefix,
            shape,
        }
    }

    /// The literal prefix without its trailing separator.
    #[must_use]
    pub fn base_directory(&self) -> &str {
        self.literal_prefix.trim_end_matches('/')
    }
}
