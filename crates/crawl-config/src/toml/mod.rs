//! crawl.toml configuration parsing and serialization

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crawl_core::error::CrawlError;
use crawl_registry::{RegistryConfig, RetryConfig, DEFAULT_REGISTRY};

use crate::ConfigResult;

/// Complete crawl.toml configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlConfig {
    /// Registry connection settings
    pub registry: RegistrySection,

    /// Retry budgets and backoff
    pub retry: RetrySection,

    /// Resolution defaults
    pub resolve: ResolveSection,
}

/// `[registry]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct RegistrySection {
    /// Base registry URL
    pub url: String,

    /// User agent override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Registry requests allowed in flight at once
    pub max_concurrent_requests: usize,
}

/// `[retry]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct RetrySection {
    /// Retries after the first attempt for non-timeout failures
    pub max_retries: u32,

    /// Retries after the first attempt for request timeouts
    pub max_timeout_retries: u32,

    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,

    /// Backoff cap in milliseconds
    pub max_delay_ms: u64,

    /// Backoff multiplier
    pub multiplier: f64,
}

/// `[resolve]` section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ResolveSection {
    /// Follow devDependencies of the root
    pub dev: bool,

    /// Follow peerDependencies of the root
    pub peer: bool,

    /// Upper bound on one resolution in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

impl Default for RegistrySection {
    fn default() -> Self {
        let defaults = RegistryConfig::default();
        Self {
            url: DEFAULT_REGISTRY.to_string(),
            user_agent: None,
            timeout_secs: defaults.request_timeout.as_secs(),
            max_concurrent_requests: defaults.max_concurrent_requests,
        }
    }
}

impl Default for RetrySection {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_retries: defaults.max_retries,
            max_timeout_retries: defaults.max_timeout_retries,
            initial_delay_ms: defaults.initial_delay.as_millis() as u64,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
            multiplier: defaults.multiplier,
        }
    }
}

impl CrawlConfig {
    /// Registry client settings described by this configuration
    pub fn registry_config(&self) -> RegistryConfig {
        let defaults = RegistryConfig::default();
        RegistryConfig {
            base_url: self.registry.url.clone(),
            user_agent: self.registry.user_agent.clone().unwrap_or(defaults.user_agent),
            request_timeout: Duration::from_secs(self.registry.timeout_secs),
            max_concurrent_requests: self.registry.max_concurrent_requests,
            retry: RetryConfig {
                max_retries: self.retry.max_retries,
                max_timeout_retries: self.retry.max_timeout_retries,
                initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
                max_delay: Duration::from_millis(self.retry.max_delay_ms),
                multiplier: self.retry.multiplier,
            },
        }
    }

    /// Resolution deadline, if one is configured
    pub fn deadline(&self) -> Option<Duration> {
        self.resolve.deadline_secs.map(Duration::from_secs)
    }
}

/// Parse TOML text into a raw table without applying defaults
pub fn parse_table(content: &str) -> ConfigResult<::toml::Table> {
    content
        .parse::<::toml::Table>()
        .map_err(|e| CrawlError::ConfigParse {
            message: format!("TOML syntax error: {}", e),
        })
}

/// Build a configuration from a raw table, filling in defaults
pub fn from_table(table: ::toml::Table) -> ConfigResult<CrawlConfig> {
    ::toml::Value::Table(table)
        .try_into()
        .map_err(|e: ::toml::de::Error| CrawlError::ConfigParse {
            message: format!("TOML parsing error: {}", e),
        })
}

/// Parse TOML string to a validated configuration
pub fn parse_crawl_toml(content: &str) -> ConfigResult<CrawlConfig> {
    let config = from_table(parse_table(content)?)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values
pub fn validate_config(config: &CrawlConfig) -> ConfigResult<()> {
    validate_registry_url(&config.registry.url)?;

    if config.registry.timeout_secs == 0 {
        return Err(invalid("registry.timeout-secs", "must be greater than zero"));
    }

    if config.registry.max_concurrent_requests == 0 {
        return Err(invalid(
            "registry.max-concurrent-requests",
            "must be greater than zero",
        ));
    }

    if !config.retry.multiplier.is_finite() || config.retry.multiplier < 1.0 {
        return Err(invalid(
            "retry.multiplier",
            &format!("must be at least 1.0, got {}", config.retry.multiplier),
        ));
    }

    if config.retry.initial_delay_ms > config.retry.max_delay_ms {
        return Err(invalid(
            "retry.initial-delay-ms",
            "must not exceed retry.max-delay-ms",
        ));
    }

    if config.resolve.deadline_secs == Some(0) {
        return Err(invalid("resolve.deadline-secs", "must be greater than zero"));
    }

    Ok(())
}

/// Read a crawl.toml file into a raw table
pub async fn load_table(path: &camino::Utf8Path) -> ConfigResult<::toml::Table> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CrawlError::io(format!("Failed to read {}", path), e))?;

    parse_table(&content).map_err(|e| in_file(path, e))
}

/// Load and parse crawl.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<CrawlConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CrawlError::io(format!("Failed to read {}", path), e))?;

    parse_crawl_toml(&content).map_err(|e| in_file(path, e))
}

fn validate_registry_url(raw: &str) -> ConfigResult<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| invalid("registry.url", &format!("'{}' is not a valid URL: {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(
            "registry.url",
            &format!("unsupported scheme '{}', expected http or https", scheme),
        )),
    }
}

fn invalid(field: &str, reason: &str) -> CrawlError {
    CrawlError::ConfigValidation {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Prefix parse errors with the file they came from
fn in_file(path: &camino::Utf8Path, error: CrawlError) -> CrawlError {
    match error {
        CrawlError::ConfigParse { message } => CrawlError::ConfigParse {
            message: format!("In file {}: {}", path, message),
        },
        CrawlError::ConfigValidation { field, reason } => CrawlError::ConfigValidation {
            field,
            reason: format!("{} (in {})", reason, path),
        },
        other => other,
    }
}
