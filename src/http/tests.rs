//! Tests for the HTTP client module

use super::testing::ScriptedTransport;
use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config(server: &MockServer) -> HttpClientConfig {
    HttpClientConfig::builder()
        .base_url(server.uri())
        .retry(RetryPolicy::new(3, Duration::from_millis(10)))
        .build()
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.retry, RetryPolicy::default());
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_none());
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://www.courtlistener.com/api/rest/v4")
        .timeout(Duration::from_secs(5))
        .max_attempts(6)
        .initial_backoff(Duration::from_millis(200))
        .token("abc123")
        .user_agent("Research/1.0 (Jo Doe jo@example.org)")
        .rate_limit(RateLimiterConfig::per_second(2))
        .build();

    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.retry.max_attempts, 6);
    assert_eq!(config.retry.initial_backoff, Duration::from_millis(200));
    assert_eq!(
        config.default_headers.get("Authorization"),
        Some(&"Token abc123".to_string())
    );
    assert_eq!(config.user_agent, "Research/1.0 (Jo Doe jo@example.org)");
    assert!(config.rate_limit.is_some());
}

#[test]
fn test_request_config_builder() {
    let config = RequestConfig::new()
        .query("date_filed__gte", "2024-01-01")
        .query("order_by", "date_filed")
        .header("X-Request-Id", "abc123")
        .timeout(Duration::from_secs(10));

    assert_eq!(
        config.query,
        vec![
            ("date_filed__gte".to_string(), "2024-01-01".to_string()),
            ("order_by".to_string(), "date_filed".to_string()),
        ]
    );
    assert_eq!(config.timeout, Some(Duration::from_secs(10)));
}

#[test]
fn test_http_client_debug_hides_headers() {
    let config = HttpClientConfig::builder().token("secret-token").build();
    let client = HttpClient::with_transport(config, ScriptedTransport::new());
    let debug_str = format!("{client:?}");
    assert!(debug_str.contains("HttpClient"));
    assert!(!debug_str.contains("secret-token"));
}

// ============================================================================
// Retry loop (scripted transport, paused clock)
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_retry_then_success_sleeps_sum_of_delays() {
    let transport = ScriptedTransport::new()
        .then_status(503)
        .then_timeout()
        .then_page(vec![json!({"id": 1})], None);
    let client = HttpClient::with_transport(HttpClientConfig::default(), transport);

    let start = Instant::now();
    let page = client
        .fetch("https://example.com/opinions/", &RequestConfig::new())
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(page.len(), 1);
    assert_eq!(client.transport().calls(), 3);
    // 1.5s after the first failure, 3s after the second
    assert!(elapsed >= Duration::from_millis(4500), "slept {elapsed:?}");
    assert!(elapsed < Duration::from_millis(4600), "slept {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhaustion() {
    let transport = ScriptedTransport::new()
        .then_status(500)
        .then_status(502)
        .then_status(504)
        .then_page(vec![json!({"id": 1})], None);
    let client = HttpClient::with_transport(HttpClientConfig::default(), transport);

    let start = Instant::now();
    let err = client
        .fetch("https://example.com/opinions/", &RequestConfig::new())
        .await
        .unwrap_err();

    match err {
        Error::FetchExhausted {
            attempts, source, ..
        } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, Error::HttpStatus { status: 504, .. }));
        }
        other => panic!("expected FetchExhausted, got {other:?}"),
    }
    assert_eq!(client.transport().calls(), 3);
    // No sleep after the final attempt
    assert!(start.elapsed() < Duration::from_millis(4600));
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_policy_does_not_sleep() {
    let transport = ScriptedTransport::new().then_timeout();
    let config = HttpClientConfig::builder().max_attempts(1).build();
    let client = HttpClient::with_transport(config, transport);

    let start = Instant::now();
    let err = client
        .fetch("https://example.com/opinions/", &RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FetchExhausted { attempts: 1, .. }));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_authorization_not_retried() {
    let transport = ScriptedTransport::new()
        .then(Ok(HttpResponse::new(401, r#"{"detail":"Invalid token."}"#)))
        .then_page(vec![], None);
    let client = HttpClient::with_transport(HttpClientConfig::default(), transport);

    let err = client
        .fetch("https://example.com/opinions/", &RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authorization { status: 401, .. }));
    assert!(err.to_string().contains("Invalid token."));
    assert_eq!(client.transport().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_bad_request_not_retried() {
    let transport = ScriptedTransport::new().then_status(400);
    let client = HttpClient::with_transport(HttpClientConfig::default(), transport);

    let err = client
        .fetch("https://example.com/opinions/", &RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 400, .. }));
    assert_eq!(client.transport().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_undecodable_body_not_retried() {
    let transport = ScriptedTransport::new().then(Ok(HttpResponse::new(200, "<html>")));
    let client = HttpClient::with_transport(HttpClientConfig::default(), transport);

    let err = client
        .fetch("https://example.com/opinions/", &RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
    assert_eq!(client.transport().calls(), 1);
}

#[tokio::test]
async fn test_prepared_request_merges_headers_and_base_url() {
    let transport = ScriptedTransport::new().then_page(vec![], None);
    let config = HttpClientConfig::builder()
        .base_url("https://example.com/api/rest/v4/")
        .token("t0k")
        .timeout(Duration::from_secs(7))
        .build();
    let client = HttpClient::with_transport(config, transport);

    client
        .fetch(
            "/opinions/",
            &RequestConfig::new()
                .query("page_size", "20")
                .header("Accept", "application/json"),
        )
        .await
        .unwrap();

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.url, "https://example.com/api/rest/v4/opinions/");
    assert_eq!(req.timeout, Duration::from_secs(7));
    assert_eq!(
        req.query,
        vec![("page_size".to_string(), "20".to_string())]
    );
    assert!(req
        .headers
        .contains(&("Authorization".to_string(), "Token t0k".to_string())));
    assert!(req
        .headers
        .contains(&("Accept".to_string(), "application/json".to_string())));
}

#[tokio::test]
async fn test_relative_url_without_base_is_rejected() {
    let transport = ScriptedTransport::new().then_page(vec![], None);
    let client = HttpClient::with_transport(HttpClientConfig::default(), transport);

    let err = client
        .fetch("/opinions/", &RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidUrl(_)));
    assert_eq!(client.transport().calls(), 0);
}

// ============================================================================
// reqwest transport (mock server)
// ============================================================================

#[tokio::test]
async fn test_fetch_sends_auth_user_agent_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opinions/"))
        .and(header("Authorization", "Token secret"))
        .and(header("User-Agent", "Research/1.0 (Jo Doe jo@example.org)"))
        .and(query_param("date_filed__gte", "2024-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "results": [{"id": 7, "date_filed": "2024-02-02"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .token("secret")
        .user_agent("Research/1.0 (Jo Doe jo@example.org)")
        .build();
    let client = HttpClient::new(config).unwrap();

    let page = client
        .fetch(
            "/opinions/",
            &RequestConfig::new().query("date_filed__gte", "2024-01-01"),
        )
        .await
        .unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page.records[0]["id"], 7);
    assert!(!page.has_next());
}

#[tokio::test]
async fn test_fetch_retries_on_500() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opinions/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/opinions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": null,
            "results": [{"id": 1}]
        })))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new(fast_config(&mock_server)).unwrap();
    let page = client
        .fetch("/opinions/", &RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_fetch_rate_limited_then_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opinions/"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new(fast_config(&mock_server)).unwrap();
    let err = client
        .fetch("/opinions/", &RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::FetchExhausted { attempts: 3, .. }));
}

#[tokio::test]
async fn test_fetch_forbidden_fails_immediately() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opinions/"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string("Please provide a valid User-Agent"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new(fast_config(&mock_server)).unwrap();
    let err = client
        .fetch("/opinions/", &RequestConfig::new())
        .await
        .unwrap_err();

    assert!(err.is_authorization());
}

#[tokio::test]
async fn test_fetch_timeout_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opinions/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .timeout(Duration::from_millis(50))
        .retry(RetryPolicy::new(2, Duration::from_millis(10)))
        .build();
    let client = HttpClient::new(config).unwrap();

    let err = client
        .fetch("/opinions/", &RequestConfig::new())
        .await
        .unwrap_err();

    match err {
        Error::FetchExhausted {
            attempts, source, ..
        } => {
            assert_eq!(attempts, 2);
            assert!(matches!(*source, Error::Timeout { timeout_ms: 50 }));
        }
        other => panic!("expected FetchExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_absolute_next_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opinions/"))
        .and(query_param("cursor", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url("https://unused.invalid")
        .build();
    let client = HttpClient::new(config).unwrap();

    let page = client
        .fetch(
            &format!("{}/opinions/?cursor=abc", mock_server.uri()),
            &RequestConfig::new(),
        )
        .await
        .unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_rate_limited_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opinions/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .rate_limit(RateLimiterConfig::new(100, 10))
        .build();
    let client = HttpClient::new(config).unwrap();
    assert!(client.has_rate_limiter());

    for _ in 0..3 {
        client
            .fetch("/opinions/", &RequestConfig::new())
            .await
            .unwrap();
    }
}
