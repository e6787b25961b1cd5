//! API Router - reverse-proxy gateway with per-provider key rotation
//!
//! Forwards `/{provider}/{path}` to the provider's base URL, injecting the
//! next credential from that provider's round-robin key pool.

pub mod config;
pub mod error;
pub mod proxy;
pub mod registry;
pub mod routes;
pub mod streaming;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

pub use crate::config::Config;
pub use crate::proxy::{ForwardOutcome, ForwardingEngine, InboundRequest};
pub use crate::registry::ProviderRegistry;

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub registry: Arc<ProviderRegistry>,
    pub engine: ForwardingEngine,
    pub start_time: Instant,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config, registry: ProviderRegistry) -> Result<Self> {
        // One pooled client for every upstream, bounded by the upstream timeout
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;

        Ok(Self::with_client(config, registry, http_client))
    }

    /// Create state around an existing HTTP client
    pub fn with_client(
        config: Config,
        registry: ProviderRegistry,
        http_client: reqwest::Client,
    ) -> Self {
        let registry = Arc::new(registry);
        let engine = ForwardingEngine::new(http_client, registry.clone());

        Self {
            config,
            registry,
            engine,
            start_time: Instant::now(),
        }
    }
}
