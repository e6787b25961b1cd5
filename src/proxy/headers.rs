//! Header utilities for provider proxying
//!
//! Caller credentials and transport framing must never cross the proxy in
//! either direction.

use axum::http::header::{self, HeaderMap, HeaderName};

/// Hop-by-hop headers that must never be forwarded
const HOP_BY_HOP_HEADERS: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Vendor-specific credential headers accepted directly by some providers
const VENDOR_CREDENTIAL_HEADERS: &[&str] = &["x-api-key", "x-goog-api-key", "api-key"];

/// Check if a header is a hop-by-hop header that should not be forwarded
pub fn is_hop_by_hop_header(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(name) || name.as_str() == "keep-alive"
}

/// Check if a header carries a caller credential
pub fn is_credential_header(name: &HeaderName) -> bool {
    name == header::AUTHORIZATION || VENDOR_CREDENTIAL_HEADERS.contains(&name.as_str())
}

/// Copy inbound headers for the upstream request.
///
/// Drops `Host`, caller credentials, hop-by-hop headers, `Content-Length`
/// (recomputed by the HTTP client) and `Accept-Encoding` (the relay strips
/// `Content-Encoding`, so upstream must answer uncompressed).
pub fn filter_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(inbound.len());

    for (name, value) in inbound {
        let dropped = name == header::HOST
            || name == header::CONTENT_LENGTH
            || name == header::ACCEPT_ENCODING
            || is_credential_header(name)
            || is_hop_by_hop_header(name);
        if !dropped {
            filtered.append(name.clone(), value.clone());
        }
    }

    filtered
}

/// Filter upstream response headers before relaying them.
///
/// Length and encoding headers are dropped because the body is re-framed here.
pub fn filter_response_headers(response_headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(response_headers.len());

    for (name, value) in response_headers {
        let dropped = name == header::CONTENT_LENGTH
            || name == header::CONTENT_ENCODING
            || is_hop_by_hop_header(name);
        if !dropped {
            filtered.append(name.clone(), value.clone());
        }
    }

    filtered
}
