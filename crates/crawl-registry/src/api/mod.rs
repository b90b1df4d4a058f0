//! npm registry API response types

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crawl_core::types::DependencyClass;

/// Full package document from the npm registry (`GET /<name>`)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PackageDocument {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,
    /// Distinguished tags (at minimum `latest`)
    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
    /// All published versions
    #[serde(default)]
    pub versions: HashMap<String, VersionRecord>,
}

/// One concrete published version of a package
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VersionRecord {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,
    /// Version string
    #[serde(default)]
    pub version: String,
    /// Dependencies
    #[serde(default, deserialize_with = "nullable_edges")]
    pub dependencies: IndexMap<String, String>,
    /// Dev dependencies
    #[serde(
        rename = "devDependencies",
        default,
        deserialize_with = "nullable_edges"
    )]
    pub dev_dependencies: IndexMap<String, String>,
    /// Peer dependencies
    #[serde(
        rename = "peerDependencies",
        default,
        deserialize_with = "nullable_edges"
    )]
    pub peer_dependencies: IndexMap<String, String>,
    /// Distribution information; absent for local manifests
    #[serde(default)]
    pub dist: Option<DistInfo>,
}

/// Distribution information for a package tarball
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DistInfo {
    /// Tarball download URL
    pub tarball: String,
    /// SHA-1 checksum (legacy)
    #[serde(default)]
    pub shasum: Option<String>,
    /// Subresource integrity hash
    #[serde(default)]
    pub integrity: Option<String>,
}

impl PackageDocument {
    /// Version pointed to by the `latest` dist-tag
    pub fn latest(&self) -> Option<&str> {
        self.dist_tag("latest")
    }

    /// Version pointed to by an arbitrary dist-tag
    pub fn dist_tag(&self, tag: &str) -> Option<&str> {
        self.dist_tags.get(tag).map(String::as_str)
    }

    /// All published version strings, in no particular order
    pub fn version_strings(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }

    /// Record for a concrete version
    pub fn record(&self, version: &str) -> Option<&VersionRecord> {
        self.versions.get(version)
    }
}

impl VersionRecord {
    /// Artifact location (tarball URL) identifying this version
    pub fn tarball(&self) -> Option<&str> {
        self.dist.as_ref().map(|dist| dist.tarball.as_str())
    }

    /// Dependency edges of one class
    pub fn edges(&self, class: DependencyClass) -> &IndexMap<String, String> {
        match class {
            DependencyClass::Production => &self.dependencies,
            DependencyClass::Development => &self.dev_dependencies,
            DependencyClass::Peer => &self.peer_dependencies,
        }
    }

    /// All edges of the given classes, in class then document order
    pub fn edges_for<'a>(
        &'a self,
        classes: &'a [DependencyClass],
    ) -> impl Iterator<Item = (DependencyClass, &'a str, &'a str)> + 'a {
        classes.iter().flat_map(move |class| {
            self.edges(*class)
                .iter()
                .map(move |(name, range)| (*class, name.as_str(), range.as_str()))
        })
    }
}

/// Accept `null` where the registry occasionally publishes it instead of a map
fn nullable_edges<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IndexMap<String, String>>::deserialize(deserializer)?.unwrap_or_default())
}
