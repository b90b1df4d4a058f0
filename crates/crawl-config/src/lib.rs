//! Configuration for crawl
//!
//! This crate handles parsing and validation of crawl.toml and package.json
//! files, and layers global, project, environment and command line settings
//! into one [`CrawlConfig`].

pub mod json;
pub mod merge;
pub mod toml;

// Re-export main types
pub use self::json::PackageJson;
pub use self::merge::{CliOverrides, ConfigLayering, ConfigLoader, ConfigSource};
pub use self::toml::{CrawlConfig, RegistrySection, ResolveSection, RetrySection};

use crawl_core::error::CrawlError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, CrawlError>;
