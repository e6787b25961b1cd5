//! Health check endpoint
//!
//! `GET /` reports a static ok status and the providers that can be routed.
//! It does not touch the forwarding engine or any upstream.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub providers: Vec<String>,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    info!("Health check endpoint accessed");

    Json(HealthResponse {
        status: "ok",
        providers: state.registry.list_active_providers(),
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
