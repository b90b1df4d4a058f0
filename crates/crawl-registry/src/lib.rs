//! npm registry client for crawl
//!
//! This crate provides HTTP client functionality for fetching package metadata
//! documents from an npm-compatible registry, with connection pooling, retry
//! logic, and a single-flight metadata cache.

pub mod api;
pub mod cache;
pub mod client;
pub mod source;

// Re-export main types
pub use api::{DistInfo, PackageDocument, VersionRecord};
pub use cache::{CacheStats, Lookup, MetadataCache};
pub use client::{RegistryClient, RegistryConfig, RetryConfig, DEFAULT_REGISTRY};
pub use source::{MemoryRegistry, PackageSource};

use crawl_core::error::CrawlError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, CrawlError>;
