//! Streaming integration tests
//!
//! Paths naming a streaming operation are relayed chunk by chunk without a
//! Content-Length; everything else is buffered with a recomputed one.

use axum::http::StatusCode;
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::common::TestHarness;
use crate::mocks::{mount_json, mount_sse, UpstreamData};

#[tokio::test]
async fn test_sse_stream_relayed_in_order() {
    let harness = TestHarness::new().await;
    mount_sse(&harness.upstream, "/openai/v1/chat/completions").await;

    let response = harness
        .server
        .post("/openai/chat/completions")
        .json(&json!({"model": "gpt-4o", "stream": true, "messages": []}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/event-stream");
    assert!(response.headers().get("content-length").is_none());
    assert_eq!(response.text(), UpstreamData::sse_body());
}

#[tokio::test]
async fn test_gemini_stream_generate_content() {
    let harness = TestHarness::new().await;

    Mock::given(method("POST"))
        .and(path("/gemini/v1beta/models/gemini-pro:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(query_param("key", "g-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(UpstreamData::sse_body(), "text/event-stream"),
        )
        .expect(1)
        .mount(&harness.upstream)
        .await;

    let response = harness
        .server
        .post("/gemini/v1beta/models/gemini-pro:streamGenerateContent")
        .add_query_param("alt", "sse")
        .json(&json!({"contents": []}))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), UpstreamData::sse_body());
}

#[tokio::test]
async fn test_non_streaming_path_is_buffered() {
    let harness = TestHarness::new().await;
    mount_json(
        &harness.upstream,
        "GET",
        "/openai/v1/models",
        200,
        UpstreamData::model_list(),
    )
    .await;

    let response = harness.server.get("/openai/models").await;

    let body = response.as_bytes().clone();
    assert_eq!(
        response.headers()["content-length"],
        body.len().to_string().as_str()
    );
}

#[tokio::test]
async fn test_streaming_path_error_is_buffered() {
    let harness = TestHarness::new().await;
    let error_body = json!({"error": {"message": "model not found"}});
    mount_json(
        &harness.upstream,
        "POST",
        "/openai/v1/chat/completions",
        404,
        error_body.clone(),
    )
    .await;

    let response = harness
        .server
        .post("/openai/chat/completions")
        .json(&json!({"model": "nope", "stream": true}))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("content-length").is_some());
    assert_eq!(response.json::<serde_json::Value>(), error_body);
}
