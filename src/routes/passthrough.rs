//! Pass-through proxy handler
//!
//! Serves `/{provider}`, `/{provider}/` and `/{provider}/{rest}`. The provider
//! segment is checked here, before any key is dispensed; everything after it
//! is forwarded verbatim.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, OriginalUri, Path, Query, State},
    http::{
        header::{self, HeaderMap},
        Method, StatusCode,
    },
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::{
    error::AppError,
    proxy::InboundRequest,
    routes::metrics::{record_error, record_request},
    AppState,
};

/// Path after the provider segment, without its leading slash.
///
/// Taken from the raw URI so percent-encoding reaches the upstream untouched.
pub fn forwarded_path(uri_path: &str) -> &str {
    uri_path
        .strip_prefix('/')
        .unwrap_or(uri_path)
        .split_once('/')
        .map(|(_, rest)| rest)
        .unwrap_or("")
}

/// Forward any supported method to the named provider
pub async fn passthrough_handler(
    State(state): State<Arc<AppState>>,
    Path(params): Path<HashMap<String, String>>,
    OriginalUri(uri): OriginalUri,
    method: Method,
    headers: HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
    body: Bytes,
) -> Result<Response, AppError> {
    let start_time = Instant::now();
    let provider = params.get("provider").cloned().unwrap_or_default();
    let path = forwarded_path(uri.path()).to_string();

    info!(
        method = %method,
        provider = %provider,
        path = %path,
        "Received request for provider"
    );

    if !state.registry.is_active(&provider) {
        warn!(provider = %provider, "Unsupported provider requested");
        record_error("unknown", "unknown_provider");
        return Err(AppError::UnknownProvider(provider));
    }

    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            let err = AppError::from(rejection);
            warn!(provider = %provider, error = %err, "Undecodable query string");
            record_error(&provider, err.kind());
            return Err(err);
        }
    };

    let inbound = InboundRequest {
        method,
        headers,
        query,
        body,
    };

    match state.engine.forward(&provider, &path, inbound).await {
        Ok(outcome) => {
            let duration = start_time.elapsed().as_secs_f64();
            record_request(&provider, outcome.status().as_u16(), duration);
            Ok(outcome.into_response())
        }
        Err(e) => {
            record_error(&provider, e.kind());
            Err(e)
        }
    }
}

/// HEAD is not forwarded
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET,POST,PUT,DELETE,PATCH")],
    )
}
