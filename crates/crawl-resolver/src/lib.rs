//! Dependency traversal engine for crawl
//!
//! Resolves the transitive dependency closure of a package against an npm
//! registry and collects the distinct tarball locations it needs. Branches
//! run concurrently, share one session-scoped metadata cache, and stop at
//! tarballs another branch already collected.

pub mod semver;
pub mod session;
pub mod traverse;

// Re-export main types
pub use semver::{select_version, VersionSelector};
pub use session::{Session, SkippedPackage};
pub use traverse::{ResolveOptions, Resolver};

use crawl_core::error::CrawlError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, CrawlError>;
