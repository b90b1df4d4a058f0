//! Package metadata source abstraction
//!
//! The resolver only needs "fetch the registry document for a name". The
//! HTTP client implements it; tests and benchmarks plug in in-memory
//! registries.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::PackageDocument;
use crate::RegistryResult;

pub use memory::MemoryRegistry;

/// Source of package metadata documents
#[async_trait]
pub trait PackageSource: Send + Sync {
    /// Fetch the full metadata document for one package name
    async fn fetch_document(&self, name: &str) -> RegistryResult<PackageDocument>;
}

#[async_trait]
impl<S: PackageSource + ?Sized> PackageSource for Arc<S> {
    async fn fetch_document(&self, name: &str) -> RegistryResult<PackageDocument> {
        (**self).fetch_document(name).await
    }
}
