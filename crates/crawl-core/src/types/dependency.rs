//! Dependency specifier types.
//!
//! Defines dependency classes and the (name, range) specifiers the
//! traversal resolves against the registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CrawlError;

/// Class of a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyClass {
    /// Runtime dependency (`dependencies`)
    Production,
    /// Development-only dependency (`devDependencies`)
    Development,
    /// Peer dependency (`peerDependencies`)
    Peer,
}

impl DependencyClass {
    /// Manifest field holding edges of this class
    pub fn manifest_key(&self) -> &'static str {
        match self {
            DependencyClass::Production => "dependencies",
            DependencyClass::Development => "devDependencies",
            DependencyClass::Peer => "peerDependencies",
        }
    }

    /// Prefix used when logging a lookup for an edge of this class
    pub fn log_label(&self) -> &'static str {
        match self {
            DependencyClass::Production => "dependency ",
            DependencyClass::Development => "devDependency ",
            DependencyClass::Peer => "peerDependency ",
        }
    }

    /// Classes followed for a root record given the caller's flags
    pub fn selected(include_dev: bool, include_peer: bool) -> Vec<DependencyClass> {
        let mut classes = vec![DependencyClass::Production];
        if include_dev {
            classes.push(DependencyClass::Development);
        }
        if include_peer {
            classes.push(DependencyClass::Peer);
        }
        classes
    }
}

impl fmt::Display for DependencyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.manifest_key())
    }
}

/// A (name, version-range) edge to resolve.
///
/// An absent range selects the registry's `latest` dist-tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencySpecifier {
    pub name: String,
    pub range: Option<String>,
}

impl DependencySpecifier {
    /// Create a specifier with an explicit range
    pub fn new(name: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: Some(range.into()),
        }
    }

    /// Create a specifier that resolves to the `latest` tag
    pub fn latest(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            range: None,
        }
    }

    /// Replace the range of this specifier
    pub fn with_range(mut self, range: Option<String>) -> Self {
        self.range = range;
        self
    }

    /// Parse `name`, `name@range`, `@scope/name` or `@scope/name@range`
    pub fn parse(input: &str) -> Result<Self, CrawlError> {
        let input = input.trim();
        let invalid = |reason: &str| CrawlError::InvalidSpecifier {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("empty package name"));
        }

        // The leading '@' of a scoped name is part of the name
        let search_from = usize::from(input.starts_with('@'));
        let (name, range) = match input[search_from..].find('@') {
            Some(offset) => {
                let at = search_from + offset;
                (&input[..at], Some(&input[at + 1..]))
            }
            None => (input, None),
        };

        if name.is_empty() || name == "@" {
            return Err(invalid("empty package name"));
        }
        if name.starts_with('@') && !name.contains('/') {
            return Err(invalid("scoped names must look like @scope/name"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(invalid("package names cannot contain whitespace"));
        }

        let range = range
            .map(str::trim)
            .filter(|range| !range.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            range,
        })
    }
}

impl FromStr for DependencySpecifier {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DependencySpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.range {
            Some(range) => write!(f, "{}@{}", self.name, range),
            None => f.write_str(&self.name),
        }
    }
}
