//! In-memory package source
//!
//! Serves pre-built documents and counts fetches per name. Used to exercise
//! the traversal without a network and to benchmark it.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use indexmap::IndexMap;

use crawl_core::error::CrawlError;

use crate::api::{DistInfo, PackageDocument, VersionRecord};
use crate::source::PackageSource;
use crate::RegistryResult;

/// Base URL used for tarballs of published in-memory packages
pub const MEMORY_REGISTRY: &str = "https://registry.example.com";

/// Tarball URL assigned to `name@version` by [`MemoryRegistry::publish`]
pub fn tarball_url(name: &str, version: &str) -> String {
    let basename = name.rsplit('/').next().unwrap_or(name);
    format!("{}/{}/-/{}-{}.tgz", MEMORY_REGISTRY, name, basename, version)
}

/// Package source backed by a map of documents
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    documents: DashMap<String, PackageDocument>,
    fetches: DashMap<String, usize>,
    unavailable: DashSet<String>,
    latency: Option<Duration>,
}

impl MemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every fetch so concurrent branches interleave
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Publish `name@version` with production dependencies.
    ///
    /// The most recently published version becomes `latest`.
    pub fn publish(&self, name: &str, version: &str, dependencies: &[(&str, &str)]) -> &Self {
        let record = VersionRecord {
            name: Some(name.to_string()),
            version: version.to_string(),
            dependencies: edges(dependencies),
            dist: Some(DistInfo {
                tarball: tarball_url(name, version),
                shasum: None,
                integrity: None,
            }),
            ..VersionRecord::default()
        };
        self.publish_record(name, record)
    }

    /// Publish a fully specified record
    pub fn publish_record(&self, name: &str, record: VersionRecord) -> &Self {
        let mut document = self.documents.entry(name.to_string()).or_insert_with(|| {
            PackageDocument {
                name: Some(name.to_string()),
                ..PackageDocument::default()
            }
        });
        document
            .dist_tags
            .insert("latest".to_string(), record.version.clone());
        document.versions.insert(record.version.clone(), record);
        self
    }

    /// Point a dist-tag at a published version
    pub fn tag(&self, name: &str, tag: &str, version: &str) -> &Self {
        if let Some(mut document) = self.documents.get_mut(name) {
            document.dist_tags.insert(tag.to_string(), version.to_string());
        }
        self
    }

    /// Make every fetch of `name` fail as if the registry were down
    pub fn make_unavailable(&self, name: &str) -> &Self {
        self.unavailable.insert(name.to_string());
        self
    }

    /// Number of fetches issued for `name`
    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches.get(name).map(|count| *count).unwrap_or(0)
    }

    /// Number of fetches issued for all names
    pub fn total_fetches(&self) -> usize {
        self.fetches.iter().map(|count| *count.value()).sum()
    }
}

#[async_trait]
impl PackageSource for MemoryRegistry {
    async fn fetch_document(&self, name: &str) -> RegistryResult<PackageDocument> {
        *self.fetches.entry(name.to_string()).or_insert(0) += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.unavailable.contains(name) {
            return Err(CrawlError::RegistryUnavailable {
                name: name.to_string(),
                attempts: 1,
                message: "registry marked unavailable".to_string(),
                source: None,
            });
        }

        self.documents
            .get(name)
            .map(|document| document.value().clone())
            .ok_or_else(|| CrawlError::PackageNotFound {
                name: name.to_string(),
            })
    }
}

fn edges(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(name, range)| (name.to_string(), range.to_string()))
        .collect()
}
