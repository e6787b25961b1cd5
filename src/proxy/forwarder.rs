//! Forwarding engine
//!
//! Builds the outbound request for a provider (credential, headers, body),
//! issues it, and relays the upstream response either buffered or streamed.
//! No retries: a transport failure or an upstream error status is surfaced
//! exactly once.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{
        header::{self, HeaderMap, HeaderName, HeaderValue},
        Method, StatusCode,
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::de::IgnoredAny;
use tracing::{warn, Instrument};

use crate::{
    error::{AppError, AppResult},
    proxy::{
        headers::{filter_request_headers, filter_response_headers},
        logging::{mask_key, RequestContext},
        policy::{is_streaming_path, CredentialPlacement, ProviderPolicy},
    },
    registry::ProviderRegistry,
    routes::metrics::record_key_dispensed,
    streaming::{relay_stream, ByteStream},
};

/// Inbound request as seen by the engine
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub headers: HeaderMap,
    /// Query parameters in arrival order
    pub query: Vec<(String, String)>,
    pub body: Bytes,
}

/// Outbound payload. JSON and raw bytes are mutually exclusive.
///
/// A JSON body has been validated but is sent exactly as received, so key
/// order and number formatting reach the upstream untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundBody {
    Json(Bytes),
    Raw(Bytes),
}

/// Fully built request, ready to send upstream
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<OutboundBody>,
    /// Relay the response lazily instead of buffering it
    pub streaming: bool,
    /// Masked form of the dispensed key, safe to log
    pub key_hint: String,
}

/// Upstream response body as relayed to the caller
pub enum ResponseBody {
    Buffered(Bytes),
    Streamed(ByteStream),
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseBody::Buffered(bytes) => {
                f.debug_tuple("Buffered").field(&bytes.len()).finish()
            }
            ResponseBody::Streamed(_) => f.write_str("Streamed"),
        }
    }
}

/// Status, filtered headers and body of an upstream response
#[derive(Debug)]
pub struct RelayedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

/// Result of a forward call that reached the upstream
#[derive(Debug)]
pub enum ForwardOutcome {
    /// 2xx from upstream
    Success(RelayedResponse),
    /// Non-success status from upstream, relayed with its original status and body
    UpstreamError(RelayedResponse),
}

impl ForwardOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardOutcome::Success(r) | ForwardOutcome::UpstreamError(r) => r.status,
        }
    }
}

impl IntoResponse for RelayedResponse {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            ResponseBody::Buffered(bytes) => {
                let len = bytes.len();
                let mut response = Response::new(Body::from(bytes));
                response
                    .headers_mut()
                    .insert(header::CONTENT_LENGTH, HeaderValue::from(len));
                response
            }
            ResponseBody::Streamed(stream) => Response::new(Body::from_stream(stream)),
        };

        *response.status_mut() = self.status;
        response.headers_mut().extend(self.headers);
        response
    }
}

impl IntoResponse for ForwardOutcome {
    fn into_response(self) -> Response {
        match self {
            ForwardOutcome::Success(r) | ForwardOutcome::UpstreamError(r) => r.into_response(),
        }
    }
}

/// Methods whose body is forwarded
fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// `application/json` or any `application/*+json` media type
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Decide what body, if any, goes upstream.
///
/// Read-only methods never forward a body. Declared JSON must parse.
fn prepare_body(
    method: &Method,
    headers: &HeaderMap,
    body: Bytes,
) -> AppResult<Option<OutboundBody>> {
    if !carries_body(method) || body.is_empty() {
        return Ok(None);
    }

    if is_json_content_type(headers) {
        serde_json::from_slice::<IgnoredAny>(&body)
            .map_err(|e| AppError::MalformedBody(e.to_string()))?;
        return Ok(Some(OutboundBody::Json(body)));
    }

    Ok(Some(OutboundBody::Raw(body)))
}

fn bearer_value(provider: &str, key: &str) -> AppResult<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| {
        AppError::Internal(anyhow::anyhow!(
            "Configured key for provider {provider} is not a valid header value"
        ))
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Forwards inbound requests to providers using rotated credentials
#[derive(Clone)]
pub struct ForwardingEngine {
    client: reqwest::Client,
    registry: Arc<ProviderRegistry>,
}

impl ForwardingEngine {
    pub fn new(client: reqwest::Client, registry: Arc<ProviderRegistry>) -> Self {
        Self { client, registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Build the outbound request without sending it.
    ///
    /// The body is checked before a key is dispensed, so a malformed request
    /// does not advance the rotation.
    pub fn build_outbound(
        &self,
        provider: &str,
        path: &str,
        inbound: InboundRequest,
    ) -> AppResult<OutboundRequest> {
        let base_url = self.registry.base_url(provider)?;
        let body = prepare_body(&inbound.method, &inbound.headers, inbound.body)?;

        let key = self.registry.next_key(provider)?;
        record_key_dispensed(provider);

        let policy = ProviderPolicy::for_provider(provider);
        let mut headers = filter_request_headers(&inbound.headers);
        let mut query = inbound.query;

        match policy.credential {
            CredentialPlacement::BearerHeader => {
                headers.insert(header::AUTHORIZATION, bearer_value(provider, key)?);
            }
            CredentialPlacement::QueryParam(param) => {
                query.retain(|(name, _)| name != param);
                query.push((param.to_string(), key.to_string()));
            }
        }

        for &(name, value) in policy.extra_headers {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        Ok(OutboundRequest {
            method: inbound.method,
            url: format!("{base_url}{path}"),
            headers,
            query,
            body,
            streaming: is_streaming_path(path),
            key_hint: mask_key(key),
        })
    }

    /// Forward one inbound request to `provider` at `path`.
    ///
    /// The caller has already checked that `provider` is active.
    pub async fn forward(
        &self,
        provider: &str,
        path: &str,
        inbound: InboundRequest,
    ) -> AppResult<ForwardOutcome> {
        let ctx = RequestContext::new(provider, path).with_method(inbound.method.as_str());

        let outbound = match self.build_outbound(provider, path, inbound) {
            Ok(outbound) => outbound,
            Err(e) => {
                warn!(
                    trace_id = %ctx.trace_id,
                    provider = %provider,
                    error = %e,
                    "Request rejected before reaching upstream"
                );
                return Err(e);
            }
        };

        let ctx = ctx.with_streaming(outbound.streaming);
        ctx.log_upstream_request(&outbound.key_hint, outbound.headers.len(), outbound.query.len());

        let span = ctx.create_span();
        self.send(outbound, ctx).instrument(span).await
    }

    /// Issue a built request and relay the response.
    pub async fn send(
        &self,
        outbound: OutboundRequest,
        ctx: RequestContext,
    ) -> AppResult<ForwardOutcome> {
        ctx.log_request_start(&outbound.url);

        let mut request = self
            .client
            .request(outbound.method, &outbound.url)
            .headers(outbound.headers);
        if !outbound.query.is_empty() {
            request = request.query(&outbound.query);
        }
        // Content-Type was copied from the inbound request
        if let Some(OutboundBody::Json(bytes) | OutboundBody::Raw(bytes)) = outbound.body {
            request = request.body(bytes);
        }

        let response = request.send().await.map_err(|e| {
            ctx.log_error(&e.to_string());
            AppError::from(e)
        })?;

        let status = response.status();
        ctx.log_upstream_response(status.as_u16());
        let headers = filter_response_headers(response.headers());

        if !status.is_success() {
            let body = response.bytes().await.map_err(|e| {
                ctx.log_error(&e.to_string());
                AppError::from(e)
            })?;
            ctx.log_upstream_error(status.as_u16(), body.len());
            return Ok(ForwardOutcome::UpstreamError(RelayedResponse {
                status,
                headers,
                body: ResponseBody::Buffered(body),
            }));
        }

        let body = if outbound.streaming {
            let upstream: ByteStream = Box::pin(response.bytes_stream());
            ResponseBody::Streamed(Box::pin(relay_stream(upstream, ctx)))
        } else {
            let bytes = response.bytes().await.map_err(|e| {
                ctx.log_error(&e.to_string());
                AppError::from(e)
            })?;
            ResponseBody::Buffered(bytes)
        };

        Ok(ForwardOutcome::Success(RelayedResponse {
            status,
            headers,
            body,
        }))
    }
}
