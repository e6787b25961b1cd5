//! HTTP routes for API Router
//!
//! `GET /` is the health check; every other path is `/{provider}[/{rest}]`.

pub mod health;
pub mod metrics;
pub mod passthrough;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// GET, POST, PUT, DELETE and PATCH; anything else is 405.
///
/// `get` would also answer HEAD, so HEAD gets an explicit rejection.
fn forwarding_methods() -> MethodRouter<Arc<AppState>> {
    get(passthrough::passthrough_handler)
        .head(passthrough::method_not_allowed)
        .post(passthrough::passthrough_handler)
        .put(passthrough::passthrough_handler)
        .delete(passthrough::passthrough_handler)
        .patch(passthrough::passthrough_handler)
}

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .route("/", get(health::health_check))
        .route("/:provider", forwarding_methods())
        .route("/:provider/", forwarding_methods())
        .route("/:provider/*rest", forwarding_methods())
        // Layers run top to bottom: panics are caught innermost, closest to the handler
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(max_body_bytes))
                .layer(CatchPanicLayer::new()),
        )
        .with_state(state)
}
