//! Tests for the HTTP client module

use super::*;
use crate::auth::{AuthConfig, DD_API_KEY_HEADER, DD_APP_KEY_HEADER};
use crate::config::TapConfig;
use crate::error::Error;
use reqwest::Method;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn with_backoff(config: HttpClientConfig, initial: Duration, max: Duration) -> HttpClientConfig {
    HttpClientConfig {
        initial_backoff: initial,
        max_backoff: max,
        ..config
    }
}

fn fast_config(base_url: String) -> HttpClientConfig {
    with_backoff(
        HttpClientConfig::builder()
            .base_url(base_url)
            .max_retries(3)
            .no_rate_limit()
            .build(),
        Duration::from_millis(10),
        Duration::from_millis(10),
    )
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 5);
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_some());
    assert_eq!(
        config.default_headers.get("Accept").map(String::as_str),
        Some("application/json")
    );
    assert_eq!(
        config.default_headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );
    assert!(config.user_agent.starts_with("tap-datadog/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.datadoghq.eu")
        .timeout(Duration::from_secs(60))
        .max_retries(2)
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, Some("https://api.datadoghq.eu".to_string()));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.initial_backoff, Duration::from_millis(500));
    assert_eq!(config.max_backoff, Duration::from_secs(60));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_http_client_config_from_tap_config() {
    let tap = TapConfig::from_json_str(
        r#"{
            "api_key": "a", "app_key": "b",
            "base_url": "https://api.us5.datadoghq.com",
            "timeout_seconds": 5,
            "max_retries": 1,
            "requests_per_second": 3,
            "user_agent": "singer-runner"
        }"#,
    )
    .unwrap();

    let config = HttpClientConfig::from_tap_config(&tap);
    assert_eq!(config.base_url.as_deref(), Some("https://api.us5.datadoghq.com"));
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.max_retries, 1);
    assert_eq!(config.rate_limit, Some(RateLimiterConfig::per_second(3)));
    assert_eq!(config.user_agent, "singer-runner");

    let tap = TapConfig::from_json_str(
        r#"{"api_key": "a", "app_key": "b", "requests_per_second": null}"#,
    )
    .unwrap();
    assert!(HttpClientConfig::from_tap_config(&tap).rate_limit.is_none());
}

#[test]
fn test_request_config_builder() {
    let config = RequestConfig::new()
        .query("from", "1")
        .query("to", "2")
        .header("X-Request-Id", "abc123")
        .json(json!({"key": "value"}))
        .retries(2);

    assert_eq!(
        config.query,
        vec![
            ("from".to_string(), "1".to_string()),
            ("to".to_string(), "2".to_string())
        ]
    );
    assert_eq!(
        config.headers.get("X-Request-Id"),
        Some(&"abc123".to_string())
    );
    assert!(config.body.is_some());
    assert_eq!(config.max_retries, Some(2));
}

#[tokio::test]
async fn test_http_client_get() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/validate"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let response = client.get("/api/v1/validate").await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_request_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(query_param("from", "1704067200"))
        .and(query_param("to", "1704153600"))
        .and(query_param("query", "avg:system.load.1{*}"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"series": []})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let data: serde_json::Value = client
        .request_json(
            Method::GET,
            "/api/v1/query",
            RequestConfig::new()
                .query("from", "1704067200")
                .query("to", "1704153600")
                .query("query", "avg:system.load.1{*}"),
        )
        .await
        .unwrap();

    assert_eq!(data, json!({"series": []}));
}

#[tokio::test]
async fn test_http_client_request_json_invalid_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let err = client
        .request_json::<serde_json::Value>(Method::GET, "/", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_http_client_post_json_body() {
    let mock_server = MockServer::start().await;
    let body = json!({"compute": [{"aggregation": "count"}]});

    Mock::given(method("POST"))
        .and(path("/api/v2/logs/analytics/aggregate"))
        .and(body_json(body.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"buckets": []}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let response = client
        .request(
            Method::POST,
            "/api/v2/logs/analytics/aggregate",
            RequestConfig::new().json(body),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_sends_datadog_keys() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/validate"))
        .and(header(DD_API_KEY_HEADER, "dd-api"))
        .and(header(DD_APP_KEY_HEADER, "dd-app"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_auth(
        fast_config(mock_server.uri()),
        AuthConfig::datadog("dd-api", "dd-app"),
    )
    .unwrap();
    let response = client.get("/api/v1/validate").await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_from_tap_config() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/validate"))
        .and(header(DD_API_KEY_HEADER, "key-1"))
        .and(header(DD_APP_KEY_HEADER, "key-2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tap = TapConfig::from_json_str(&format!(
        r#"{{"api_key": "key-1", "app_key": "key-2", "base_url": "{}"}}"#,
        mock_server.uri()
    ))
    .unwrap();
    let client = HttpClient::from_tap_config(&tap).unwrap();
    assert!(client.has_rate_limiter());

    let response = client.get("/api/v1/validate").await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_request_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(header("X-Request-Id", "req-456"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let response = client
        .request(
            Method::GET,
            "/api/v1/query",
            RequestConfig::new().header("X-Request-Id", "req-456"),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_403_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/validate"))
        .respond_with(ResponseTemplate::new(403).set_body_string(r#"{"errors":["Forbidden"]}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let err = client.get("/api/v1/validate").await.unwrap_err();

    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("Forbidden"));
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_client_retry_on_500() {
    let mock_server = MockServer::start().await;

    // First two calls return 500, third succeeds
    Mock::given(method("GET"))
        .and(path("/api/v1/slo/abc/history"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/slo/abc/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let response = client.get("/api/v1/slo/abc/history").await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_rate_limit_reset_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-ratelimit-reset", "0")
                .set_body_string("Rate limited"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"series": []})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(mock_server.uri())).unwrap();
    let response = client.get("/api/v1/query").await.unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_http_client_rate_limit_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .max_retries(1)
        .no_rate_limit()
        .build();
    let client = HttpClient::with_config(config).unwrap();
    let err = client.get("/api/v1/query").await.unwrap_err();

    assert!(matches!(
        err,
        Error::RateLimited {
            retry_after_seconds: 0
        }
    ));
}

#[tokio::test]
async fn test_http_client_max_retries_exceeded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/always-fail"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = with_backoff(
        HttpClientConfig::builder()
            .base_url(mock_server.uri())
            .max_retries(2)
            .no_rate_limit()
            .build(),
        Duration::from_millis(10),
        Duration::from_millis(10),
    );

    let client = HttpClient::with_config(config).unwrap();
    let err = client.get("/api/always-fail").await.unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_http_client_full_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/test"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder().no_rate_limit().build();
    let client = HttpClient::with_config(config).unwrap();

    let response = client
        .get(&format!("{}/api/test", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[test]
fn test_build_url() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.datadoghq.com/")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(
        client.build_url("/api/v1/validate"),
        "https://api.datadoghq.com/api/v1/validate"
    );
    assert_eq!(
        client.build_url("api/v1/validate"),
        "https://api.datadoghq.com/api/v1/validate"
    );
    assert_eq!(client.build_url("http://other/x"), "http://other/x");
}

#[test]
fn test_calculate_backoff_exponential_is_capped() {
    let config = with_backoff(
        HttpClientConfig::builder().no_rate_limit().build(),
        Duration::from_millis(100),
        Duration::from_millis(500),
    );

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(client.calculate_backoff(3), Duration::from_millis(500));
    assert_eq!(client.calculate_backoff(40), Duration::from_millis(500));
}

#[test]
fn test_http_client_debug_hides_keys() {
    let client = HttpClient::with_auth(
        HttpClientConfig::default(),
        AuthConfig::datadog("very-secret", "also-secret"),
    )
    .unwrap();
    let debug_str = format!("{client:?}");
    assert!(debug_str.contains("HttpClient"));
    assert!(!debug_str.contains("very-secret"));
    assert!(!debug_str.contains("also-secret"));
}

#[tokio::test]
async fn test_http_client_with_rate_limiter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .rate_limit(RateLimiterConfig::new(100, 10))
        .build();

    let client = HttpClient::with_config(config).unwrap();
    assert!(client.has_rate_limiter());

    for _ in 0..3 {
        let response = client.get("/api/v1/query").await.unwrap();
        assert_eq!(response.status(), 200);
    }
}
