//! # crawl-core
//!
//! Core types and utilities shared across all crawl crates.
//!
//! This crate provides:
//! - `CrawlError` enum for unified error handling
//! - Dependency classes and dependency specifiers used by the traversal
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (DependencySpecifier, DependencyClass)
//! - `error`: Error types and result aliases

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{CrawlError, CrawlResult};
pub use types::{DependencyClass, DependencySpecifier};
