//! Request logging utilities for provider proxying
//!
//! Structured logging with a short correlation ID per forwarded request.

use std::time::Instant;
use tracing::{debug, error, info, warn, Span};
use uuid::Uuid;

/// Context for tracking a forwarded request through the system
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (for log correlation)
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// Provider routing name
    pub provider: String,
    /// Path forwarded to the provider
    pub path: String,
    /// HTTP method of the inbound request
    pub method: String,
    /// Whether the response is relayed as a stream
    pub streaming: bool,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(provider: &str, path: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(), // Short ID for readability
            start_time: Instant::now(),
            provider: provider.to_string(),
            path: path.to_string(),
            method: String::new(),
            streaming: false,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Mark this as a streaming request
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Log that a request is about to be forwarded
    pub fn log_request_start(&self, url: &str) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            method = %self.method,
            url = %url,
            streaming = %self.streaming,
            "Forwarding request"
        );
    }

    /// Log the outbound request shape (debug level, no secrets)
    pub fn log_upstream_request(&self, key_hint: &str, header_count: usize, query_count: usize) {
        debug!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            key = %key_hint,
            header_count = header_count,
            query_count = query_count,
            "Request built for upstream"
        );
    }

    /// Log response received from upstream
    pub fn log_upstream_response(&self, status: u16) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            path = %self.path,
            status = %status,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    /// Log a non-success upstream status that is relayed as is
    pub fn log_upstream_error(&self, status: u16, body_len: usize) {
        warn!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            path = %self.path,
            status = %status,
            body_len = body_len,
            elapsed_ms = %self.elapsed_ms(),
            "Upstream returned an error status"
        );
    }

    /// Log stream ended
    pub fn log_stream_ended(&self, chunks: usize, bytes: usize) {
        info!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            path = %self.path,
            chunks = chunks,
            bytes = bytes,
            elapsed_ms = %self.elapsed_ms(),
            "Streaming response ended"
        );
    }

    /// Log a caller that went away before the stream finished
    pub fn log_stream_abandoned(&self, chunks: usize) {
        debug!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            chunks = chunks,
            elapsed_ms = %self.elapsed_ms(),
            "Client disconnected, upstream stream released"
        );
    }

    /// Log request failure
    pub fn log_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            provider = %self.provider,
            path = %self.path,
            streaming = %self.streaming,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Request failed"
        );
    }

    /// Create a tracing span for this request
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "forward",
            trace_id = %self.trace_id,
            provider = %self.provider,
            path = %self.path,
        )
    }
}

/// Mask a credential for logs, keeping only the last four characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
