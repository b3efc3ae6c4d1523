//! A canonical, validated representation of a path into the model graph.
//!
//! Paths are dot-separated (`tasks.compile`). The root path has no segments
//! and renders as `<root>`. Ordering is lexicographic over segments, so a
//! parent always sorts immediately before its descendants.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, Result};

const SEPARATOR: char = '.';
const ROOT_DISPLAY: &str = "<root>";

static SEGMENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("segment pattern is a valid regex")
});

/// Checks a single path segment.
///
/// Segments start with an ASCII letter or `_` and contain only ASCII
/// letters, digits, `_` or `-`.
pub fn validate_name(name: &str) -> Result<()> {
    if SEGMENT_PATTERN.is_match(name) {
        return Ok(());
    }
    let Some(first) = name.chars().next() else {
        return Err(ModelError::invalid_path(name, "segment must not be empty"));
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(ModelError::invalid_path(
            name,
            format!("segment '{name}' has illegal first character '{first}' (must be an ASCII letter or '_')"),
        ));
    }
    let bad = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        .unwrap_or(first);
    Err(ModelError::invalid_path(
        name,
        format!("segment '{name}' contains illegal character '{bad}'"),
    ))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModelPath(Vec<String>);

impl ModelPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parses dotted path text. Empty text is the root path.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for (index, segment) in text.split(SEPARATOR).enumerate() {
            if segment.is_empty() {
                return Err(ModelError::invalid_path(
                    text,
                    format!("empty segment at position {}", index + 1),
                ));
            }
            validate_name(segment).map_err(|e| match e {
                ModelError::InvalidPath { reason, .. } => ModelError::invalid_path(text, reason),
                other => other,
            })?;
            segments.push(segment.to_string());
        }
        Ok(Self(segments))
    }

    pub fn from_segments<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        for segment in &segments {
            validate_name(segment)?;
        }
        Ok(Self(segments))
    }

    pub fn child(&self, name: &str) -> Result<Self> {
        validate_name(name)?;
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Ok(Self(segments))
    }

    /// The enclosing path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, init) = self.0.split_last()?;
        Some(Self(init.to_vec()))
    }

    /// The last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_direct_child_of(&self, other: &ModelPath) -> bool {
        self.depth() == other.depth() + 1 && self.0.starts_with(&other.0)
    }

    /// True when `self` lies strictly below `other`.
    pub fn is_descendant_of(&self, other: &ModelPath) -> bool {
        self.depth() > other.depth() && self.0.starts_with(&other.0)
    }
}

impl fmt::Display for ModelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(ROOT_DISPLAY);
        }
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for ModelPath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ModelPath {
    type Error = ModelError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for ModelPath {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

// Round-trips through `parse`: the root serializes as the empty string.
impl From<ModelPath> for String {
    fn from(path: ModelPath) -> Self {
        path.0.join(".")
    }
}
