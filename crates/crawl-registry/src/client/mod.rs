//! HTTP client implementation with connection pooling and retry logic

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crawl_core::error::CrawlError;

use crate::api::PackageDocument;
use crate::source::PackageSource;
use crate::RegistryResult;

/// Public npm registry
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Configuration for bounded exponential backoff
///
/// Timeouts and other failures draw from separate budgets: a timed-out
/// request is usually worth retrying more often than one the registry
/// actively rejected.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt for non-timeout failures
    pub max_retries: u32,
    /// Retries after the first attempt for request timeouts
    pub max_timeout_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_timeout_retries: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay to wait after the given one.
    ///
    /// Products that are not a valid duration (negative, NaN, overflow)
    /// fall back to `max_delay`.
    pub fn next_delay(&self, delay: Duration) -> Duration {
        let scaled = delay.as_secs_f64() * self.multiplier;
        Duration::try_from_secs_f64(scaled).map_or(self.max_delay, |next| next.min(self.max_delay))
    }
}

/// Connection settings for a registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Base registry URL
    pub base_url: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Maximum registry requests in flight at once
    pub max_concurrent_requests: usize,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY.to_string(),
            user_agent: concat!("crawl/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(30),
            max_concurrent_requests: 32,
            retry: RetryConfig::default(),
        }
    }
}

/// Outcome of a single failed request attempt
#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("package not found")]
    NotFound,
    #[error("registry returned status {0}")]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("request limiter closed")]
    LimiterClosed,
}

impl AttemptError {
    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            AttemptError::Timeout(error)
        } else {
            AttemptError::Transport(error)
        }
    }

    /// Short error code for log lines
    fn code(&self) -> String {
        match self {
            AttemptError::Timeout(_) => "ETIMEDOUT".to_string(),
            AttemptError::NotFound => "E404".to_string(),
            AttemptError::Status(status) => format!("E{}", status.as_u16()),
            AttemptError::Transport(e) if e.is_connect() => "ECONNECT".to_string(),
            AttemptError::Transport(e) if e.is_decode() => "EDECODE".to_string(),
            AttemptError::Transport(_) => "EREQUEST".to_string(),
            AttemptError::LimiterClosed => "ECLOSED".to_string(),
        }
    }
}

/// Main HTTP client for npm registry operations
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Caps requests in flight across all clones of this client
    limiter: Arc<Semaphore>,
    /// Connection and retry configuration
    config: RegistryConfig,
}

impl RegistryClient {
    /// Create new registry client for the public registry
    pub fn new() -> RegistryResult<Self> {
        Self::with_config(RegistryConfig::default())
    }

    /// Create registry client with custom configuration
    pub fn with_config(mut config: RegistryConfig) -> RegistryResult<Self> {
        let parsed = url::Url::parse(&config.base_url).map_err(|e| CrawlError::ConfigValidation {
            field: "registry.url".to_string(),
            reason: format!("'{}' is not a valid URL: {}", config.base_url, e),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CrawlError::ConfigValidation {
                field: "registry.url".to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        let client = ClientBuilder::new()
            // Connection pooling configuration
            .pool_max_idle_per_host(config.max_concurrent_requests)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(config.request_timeout)
            .gzip(true)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| CrawlError::ConfigValidation {
                field: "registry".to_string(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            limiter: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            config,
        })
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Metadata URL for a package name
    pub fn document_url(&self, package_name: &str) -> String {
        format!("{}/{}", self.config.base_url, encode_package_name(package_name))
    }

    /// Fetch a package document with retry logic
    pub async fn fetch_metadata(&self, package_name: &str) -> RegistryResult<PackageDocument> {
        let url = self.document_url(package_name);
        self.with_retry(package_name, &url, || self.fetch_once(&url))
            .await
    }

    async fn fetch_once(&self, url: &str) -> Result<PackageDocument, AttemptError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| AttemptError::LimiterClosed)?;

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(AttemptError::from_reqwest)?;

        match response.status() {
            StatusCode::OK => response
                .json::<PackageDocument>()
                .await
                .map_err(AttemptError::from_reqwest),
            StatusCode::NOT_FOUND => Err(AttemptError::NotFound),
            status => Err(AttemptError::Status(status)),
        }
    }

    /// Execute a request with bounded exponential backoff
    async fn with_retry<F, Fut, T>(&self, name: &str, url: &str, operation: F) -> RegistryResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, AttemptError>>,
    {
        let retry = &self.config.retry;
        let mut delay = retry.initial_delay;
        let mut retries_left = retry.max_retries;
        let mut timeout_retries_left = retry.max_timeout_retries;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let error = match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => error,
            };

            // Not-found is an answer, not a failure
            if matches!(error, AttemptError::NotFound) {
                debug!(url, "package not found");
                return Err(CrawlError::PackageNotFound {
                    name: name.to_string(),
                });
            }
            if matches!(error, AttemptError::LimiterClosed) {
                return Err(CrawlError::registry(name, attempts, error.to_string(), error));
            }

            let remaining = if matches!(error, AttemptError::Timeout(_)) {
                &mut timeout_retries_left
            } else {
                &mut retries_left
            };

            warn!(
                code = %error.code(),
                url,
                attempt = attempts,
                remaining = *remaining,
                "failed download"
            );

            if *remaining == 0 {
                return Err(CrawlError::registry(name, attempts, error.to_string(), error));
            }
            *remaining -= 1;

            tokio::time::sleep(delay).await;
            delay = retry.next_delay(delay);
        }
    }
}

#[async_trait]
impl PackageSource for RegistryClient {
    async fn fetch_document(&self, name: &str) -> RegistryResult<PackageDocument> {
        self.fetch_metadata(name).await
    }
}

/// Encode package name for URL: `@scope/pkg` becomes `@scope%2Fpkg`.
///
/// Only the first separator is encoded; scoped names have exactly one.
pub fn encode_package_name(name: &str) -> String {
    name.replacen('/', "%2F", 1)
}
