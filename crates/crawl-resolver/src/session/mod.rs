//! Resolution session state
//!
//! A session owns everything the concurrent branches of one logical
//! resolution share: the metadata cache, the set of collected tarball
//! locations, and the packages that had to be skipped. Branches receive it
//! by `Arc`; nothing about it is process-global.

use std::collections::BTreeSet;

use dashmap::{DashMap, DashSet};
use serde::Serialize;

use crawl_core::types::{DependencyClass, DependencySpecifier};
use crawl_registry::{MetadataCache, VersionRecord};

/// A dependency edge that contributed nothing because it could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPackage {
    /// The edge as requested
    pub specifier: DependencySpecifier,
    /// Class of the edge; `None` for the root request
    pub class: Option<DependencyClass>,
    /// Why it was skipped
    pub reason: String,
}

/// Shared state for one logical resolution
#[derive(Debug, Default)]
pub struct Session {
    /// Registry documents by package name
    cache: MetadataCache,
    /// Tarball locations collected so far
    artifacts: DashSet<String>,
    /// `name@version` of visited records that carry no tarball
    untracked: DashSet<String>,
    /// Skipped edges, one entry per distinct specifier
    skipped: DashMap<DependencySpecifier, SkippedPackage>,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata cache shared by every branch of this session
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Mark a record as visited.
    ///
    /// Returns `false` if it was visited before, in which case its
    /// dependencies must not be traversed again. Records are keyed by
    /// tarball location; records without one fall back to `name@version`.
    pub fn visit(&self, name: &str, record: &VersionRecord) -> bool {
        match record.tarball() {
            Some(tarball) => self.artifacts.insert(tarball.to_string()),
            None => self.untracked.insert(format!("{}@{}", name, record.version)),
        }
    }

    /// Sorted snapshot of the collected tarball locations
    pub fn artifacts(&self) -> BTreeSet<String> {
        self.artifacts.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of collected tarball locations
    pub fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    /// Record an edge that was skipped
    pub fn record_skip(&self, skipped: SkippedPackage) {
        self.skipped.entry(skipped.specifier.clone()).or_insert(skipped);
    }

    /// Skipped edges, sorted by package name
    pub fn skipped(&self) -> Vec<SkippedPackage> {
        let mut skipped: Vec<_> = self.skipped.iter().map(|entry| entry.value().clone()).collect();
        skipped.sort_by(|a, b| a.specifier.name.cmp(&b.specifier.name));
        skipped
    }
}
