//! HTTP client module
//!
//! Provides the GET client used to fetch result pages, with retry and backoff.
//!
//! # Features
//!
//! - **Automatic Retries**: transient failures are retried per [`RetryPolicy`]
//! - **Exponential Backoff**: pure delay function, testable without I/O
//! - **Pluggable Transport**: [`Transport`] separates the retry loop from reqwest
//! - **Rate Limiting**: optional token bucket limiter using governor

mod client;
mod rate_limit;
mod retry;
mod transport;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::RetryPolicy;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests;
