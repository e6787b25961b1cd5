//! Error path integration tests
//!
//! Router-side failures produce a JSON error body and never reach the
//! upstream. Upstream error statuses are relayed as-is.

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use wiremock::{
    matchers::{header, method, path},
    Mock, ResponseTemplate,
};

use crate::common::TestHarness;
use crate::mocks::{mount_never_called, UpstreamData};

#[tokio::test]
async fn test_unknown_provider_rejected() {
    let harness = TestHarness::new().await;
    mount_never_called(&harness.upstream).await;

    let response = harness.server.post("/anthropic/v1/messages").json(&json!({})).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNKNOWN_PROVIDER");
    assert_eq!(body["error"]["message"], "Provider anthropic not supported");
}

#[tokio::test]
async fn test_provider_without_keys_is_unknown() {
    let harness = TestHarness::new().await;
    mount_never_called(&harness.upstream).await;

    let response = harness.server.get("/keyless/models").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "UNKNOWN_PROVIDER");
}

#[tokio::test]
async fn test_provider_without_base_url() {
    let upstream = wiremock::MockServer::start().await;
    let harness = TestHarness::with_providers(upstream, "nourl:\n  keys: [k1]\n");

    let response = harness.server.get("/nourl/models").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "UNKNOWN_PROVIDER");
}

#[tokio::test]
async fn test_malformed_json_rejected_without_rotating() {
    let harness = TestHarness::new().await;

    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(UpstreamData::chat_completion()))
        .expect(1)
        .mount(&harness.upstream)
        .await;

    let response = harness
        .server
        .post("/openai/chat/completions")
        .text("{\"model\": ")
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "INVALID_JSON");
    assert_eq!(harness.state.registry.cursor("openai"), Some(0));

    // The next valid request still gets the first key
    let response = harness
        .server
        .post("/openai/chat/completions")
        .json(&json!({"model": "gpt-4o"}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_upstream_error_status_relayed() {
    let harness = TestHarness::new().await;

    Mock::given(method("POST"))
        .and(path("/openai/v1/embeddings"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "20")
                .set_body_json(UpstreamData::rate_limited()),
        )
        .expect(1)
        .mount(&harness.upstream)
        .await;

    let response = harness
        .server
        .post("/openai/embeddings")
        .json(&json!({"input": "x"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "20");
    assert_eq!(response.json::<Value>(), UpstreamData::rate_limited());
}

#[tokio::test]
async fn test_upstream_error_does_not_retry() {
    let harness = TestHarness::new().await;

    Mock::given(method("GET"))
        .and(path("/openai/v1/models"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&harness.upstream)
        .await;

    let response = harness.server.get("/openai/models").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.text(), "bad key");
    assert_eq!(harness.state.registry.cursor("openai"), Some(1));
}

#[tokio::test]
async fn test_transport_failure_is_500() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/unreachable/models").await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UPSTREAM_TRANSPORT_ERROR");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Request failed"));
}

#[tokio::test]
async fn test_unsupported_method_is_405() {
    let harness = TestHarness::new().await;
    mount_never_called(&harness.upstream).await;

    let response = harness.server.method(Method::TRACE, "/openai/models").await;

    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_head_is_not_forwarded() {
    let harness = TestHarness::new().await;
    mount_never_called(&harness.upstream).await;

    let response = harness.server.method(Method::HEAD, "/openai/models").await;

    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["allow"], "GET,POST,PUT,DELETE,PATCH");
    assert_eq!(harness.state.registry.cursor("openai"), Some(0));
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let harness = TestHarness::new().await;
    mount_never_called(&harness.upstream).await;

    let payload = "a".repeat(2 * 1024 * 1024);
    let response = harness
        .server
        .post("/openai/files")
        .text(payload)
        .content_type("text/plain")
        .await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
}
