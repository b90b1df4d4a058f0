//! Error types and result aliases for crawl operations.
//!
//! Provides a unified error type that covers registry, resolution,
//! configuration and IO failures with actionable error messages.

use thiserror::Error;

/// Unified error type for all crawl operations
#[derive(Error, Debug)]
pub enum CrawlError {
    // Registry errors
    #[error("Registry unavailable for '{name}' after {attempts} attempt(s): {message}")]
    RegistryUnavailable {
        name: String,
        attempts: u32,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    // Resolution errors
    #[error("No version of '{name}' satisfies '{range}'")]
    NoSatisfyingVersion { name: String, range: String },

    #[error("Registry document for '{name}' has no record for version {version}")]
    MissingVersionRecord { name: String, version: String },

    #[error("Invalid package specifier '{input}': {reason}")]
    InvalidSpecifier { input: String, reason: String },

    #[error("Resolution deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    // Config errors
    #[error("Failed to parse manifest {path}: {message}")]
    ManifestParse { path: String, message: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for crawl operations
pub type CrawlResult<T> = Result<T, CrawlError>;

impl CrawlError {
    /// Create a registry error from any error type
    pub fn registry<E>(name: &str, attempts: u32, message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::RegistryUnavailable {
            name: name.to_string(),
            attempts,
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is absorbed by the traversal instead of aborting a branch.
    ///
    /// Resolution-logic failures only shrink the result set; network-layer
    /// failures and deadlines propagate to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CrawlError::NoSatisfyingVersion { .. } | CrawlError::MissingVersionRecord { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            CrawlError::RegistryUnavailable { .. } => {
                Some("Check your internet connection or the configured registry URL and try again")
            },
            CrawlError::PackageNotFound { .. } => {
                Some("Check the package name spelling or the configured registry")
            },
            CrawlError::NoSatisfyingVersion { .. } => {
                Some("Loosen the version range or check the published versions")
            },
            CrawlError::DeadlineExceeded { .. } => {
                Some("Raise the deadline with --deadline or CRAWL_DEADLINE_SECS")
            },
            CrawlError::ConfigValidation { .. } | CrawlError::ConfigParse { .. } => {
                Some("Fix crawl.toml or the CRAWL_* environment variables")
            },
            _ => None,
        }
    }
}
