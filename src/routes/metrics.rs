//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring. The
//! endpoint is served on its own listener so it never shadows a provider name.

use axum::{response::IntoResponse, routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

/// Register all custom metrics
fn register_metrics() {
    metrics::describe_counter!(
        "api_router_requests_total",
        "Total number of forwarded requests by upstream status"
    );
    metrics::describe_histogram!(
        "api_router_request_duration_seconds",
        "Time until the upstream response head was relayed"
    );
    metrics::describe_counter!(
        "api_router_key_dispensed_total",
        "Credentials handed out by the key rotation"
    );
    metrics::describe_counter!(
        "api_router_errors_total",
        "Requests that failed before an upstream response was relayed"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Router for the dedicated metrics listener
pub fn metrics_router() -> Router {
    Router::new().route("/metrics", get(prometheus_metrics))
}

/// Record a request that reached the upstream
pub fn record_request(provider: &str, status: u16, duration_secs: f64) {
    metrics::counter!(
        "api_router_requests_total",
        "provider" => provider.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("api_router_request_duration_seconds", "provider" => provider.to_string())
        .record(duration_secs);
}

/// Record one key dispense
pub fn record_key_dispensed(provider: &str) {
    metrics::counter!("api_router_key_dispensed_total", "provider" => provider.to_string())
        .increment(1);
}

/// Record a request that failed inside the router
pub fn record_error(provider: &str, kind: &str) {
    metrics::counter!(
        "api_router_errors_total",
        "provider" => provider.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}
