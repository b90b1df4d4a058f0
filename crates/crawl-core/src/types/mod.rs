//! Core data types for dependency traversal.
//!
//! This module provides the fundamental types used throughout crawl:
//! - Dependency classes (production, development, peer)
//! - Dependency specifiers (name plus optional version range)

pub mod dependency;

// Re-export all public types
pub use dependency::{DependencyClass, DependencySpecifier};
