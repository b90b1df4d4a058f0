//! package.json loading

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crawl_core::error::CrawlError;
use crawl_core::types::DependencyClass;
use crawl_registry::VersionRecord;

use crate::ConfigResult;

/// The parts of a package.json that take part in resolution
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    /// Package name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Package version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Package description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Private flag
    #[serde(default)]
    pub private: bool,

    /// Runtime dependencies
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,

    /// Development dependencies
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,

    /// Peer dependencies
    #[serde(default)]
    pub peer_dependencies: IndexMap<String, String>,
}

impl PackageJson {
    /// Dependencies of one class
    pub fn edges(&self, class: DependencyClass) -> &IndexMap<String, String> {
        match class {
            DependencyClass::Production => &self.dependencies,
            DependencyClass::Development => &self.dev_dependencies,
            DependencyClass::Peer => &self.peer_dependencies,
        }
    }

    /// Number of declared dependencies across the given classes
    pub fn dependency_count(&self, classes: &[DependencyClass]) -> usize {
        classes.iter().map(|class| self.edges(*class).len()).sum()
    }

    /// Convert to the record shape the resolver walks.
    ///
    /// A local manifest has no tarball of its own, so only its
    /// dependencies contribute artifacts.
    pub fn to_version_record(&self) -> VersionRecord {
        VersionRecord {
            name: self.name.clone(),
            version: self.version.clone().unwrap_or_else(|| "0.0.0".to_string()),
            dependencies: self.dependencies.clone(),
            dev_dependencies: self.dev_dependencies.clone(),
            peer_dependencies: self.peer_dependencies.clone(),
            dist: None,
        }
    }
}

/// Parse JSON string to PackageJson
pub fn parse_package_json(content: &str) -> ConfigResult<PackageJson> {
    serde_json::from_str(content).map_err(|e| CrawlError::ManifestParse {
        path: "package.json".to_string(),
        message: e.to_string(),
    })
}

/// Load and parse package.json from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<PackageJson> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CrawlError::io(format!("Failed to read {}", path), e))?;

    parse_package_json(&content).map_err(|e| match e {
        CrawlError::ManifestParse { message, .. } => CrawlError::ManifestParse {
            path: path.to_string(),
            message,
        },
        other => other,
    })
}
