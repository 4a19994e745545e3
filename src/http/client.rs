//! HTTP client with retry and rate limiting
//!
//! Provides the page-fetching client that handles:
//! - Automatic retries with exponential backoff
//! - Optional rate limiting to stay under API quotas
//! - Authorization and User-Agent headers on every request
//! - Error classification for retry decisions

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::retry::RetryPolicy;
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::error::{Error, Result};
use crate::types::Page;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Longest response body excerpt kept in error messages
const MAX_ERROR_BODY: usize = 500;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for relative endpoints
    pub base_url: Option<String>,
    /// Per-attempt request timeout
    pub timeout: Duration,
    /// Retry policy for transient failures
    pub retry: RetryPolicy,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: BTreeMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            rate_limit: None,
            default_headers: BTreeMap::new(),
            user_agent: format!("courtsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set max attempts, keeping the current backoff
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry.max_attempts = attempts.max(1);
        self
    }

    /// Set the initial backoff delay
    pub fn initial_backoff(mut self, delay: Duration) -> Self {
        self.config.retry.initial_backoff = delay;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Send `Authorization: Token <token>` with every request
    pub fn token(self, token: impl AsRef<str>) -> Self {
        let value = format!("Token {}", token.as_ref());
        self.header("Authorization", value)
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient<T = ReqwestTransport> {
    transport: T,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient<ReqwestTransport> {
    /// Create a client backed by reqwest
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.user_agent)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> HttpClient<T> {
    /// Create a client over any transport
    pub fn with_transport(config: HttpClientConfig, transport: T) -> Self {
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);
        Self {
            transport,
            config,
            rate_limiter,
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Get the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Fetch one page, retrying transient failures.
    ///
    /// Authorization failures, other client errors and undecodable bodies
    /// are returned at once. Transient failures are retried until the policy
    /// runs out of attempts, then surface as [`Error::FetchExhausted`].
    pub async fn fetch(&self, url: &str, config: &RequestConfig) -> Result<Page> {
        let request = self.prepare(url, config)?;
        let policy = self.config.retry;
        let mut attempt = 0;

        loop {
            attempt += 1;

            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            debug!(
                url = %request.url,
                query = ?request.query,
                "GET attempt {}/{}",
                attempt,
                policy.max_attempts
            );

            let err = match self.attempt(&request).await {
                Ok(page) => {
                    debug!(
                        "Fetched {} records (next page: {})",
                        page.len(),
                        page.has_next()
                    );
                    return Ok(page);
                }
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };

            if !policy.should_retry(attempt) {
                warn!(
                    "Giving up on {} after {} attempts: {}",
                    request.url, attempt, err
                );
                return Err(Error::FetchExhausted {
                    attempts: attempt,
                    url: request.url,
                    source: Box::new(err),
                });
            }

            let delay = policy.delay_for_attempt(attempt);
            warn!(
                "Transient failure ({}), attempt {}/{}, retrying in {:?}",
                err, attempt, policy.max_attempts, delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One exchange plus status classification
    async fn attempt(&self, request: &HttpRequest) -> Result<Page> {
        let response = self.transport.get(request).await?;
        check_status(&response)?;
        Page::from_body(&response.body)
    }

    /// Merge client defaults with per-request settings
    fn prepare(&self, url: &str, config: &RequestConfig) -> Result<HttpRequest> {
        let mut headers = self.config.default_headers.clone();
        headers.extend(config.headers.clone());

        Ok(HttpRequest {
            url: self.build_url(url)?,
            query: config.query.clone(),
            headers: headers.into_iter().collect(),
            timeout: config.timeout.unwrap_or(self.config.timeout),
        })
    }

    /// Build full URL from path, rejecting anything that is not an absolute URL
    fn build_url(&self, path: &str) -> Result<String> {
        let full = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            match &self.config.base_url {
                Some(base) => {
                    let base = base.trim_end_matches('/');
                    let path = path.trim_start_matches('/');
                    format!("{base}/{path}")
                }
                None => path.to_string(),
            }
        };

        Url::parse(&full)?;
        Ok(full)
    }
}

impl<T> std::fmt::Debug for HttpClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .field("retry", &self.config.retry)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Turn a non-2xx response into the matching error
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }

    let body = excerpt(&response.body);
    match response.status {
        401 | 403 => Err(Error::authorization(response.status, &body)),
        status => Err(Error::http_status(status, body)),
    }
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
