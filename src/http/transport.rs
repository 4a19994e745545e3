//! Transport layer
//!
//! A single GET exchange, with reqwest errors classified into the crate's
//! error taxonomy so the retry loop can decide what is transient.

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// A fully prepared GET request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Absolute URL
    pub url: String,
    /// Query parameters, sent in order
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: Vec<(String, String)>,
    /// Per-attempt timeout
    pub timeout: Duration,
}

/// Status and body of a completed exchange
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Create a response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs one GET exchange
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and read the whole body
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Production transport backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport sending the given User-Agent
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut req = self.client.get(&request.url).timeout(request.timeout);

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        let response = req
            .send()
            .await
            .map_err(|e| classify(e, request.timeout))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify(e, request.timeout))?;

        Ok(HttpResponse { status, body })
    }
}

/// Map a reqwest failure onto the retry taxonomy
fn classify(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        return Error::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        };
    }
    if err.is_connect() || err.is_request() || err.is_body() {
        return Error::connection(err.to_string());
    }
    Error::Http(err)
}
