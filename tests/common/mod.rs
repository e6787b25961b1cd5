//! Common test utilities for API Router
//!
//! Builds the full router against a wiremock upstream so every provider's
//! base URL points at the mock server.

#![allow(dead_code)]

use std::sync::Arc;

use api_router::{
    config::parse_providers, routes::create_router, AppState, Config, ProviderRegistry,
};
use axum_test::TestServer;
use wiremock::MockServer;

/// Test configuration constants
pub mod constants {
    pub const OPENAI_KEYS: [&str; 3] = ["sk-a", "sk-b", "sk-c"];
    pub const GEMINI_KEYS: [&str; 2] = ["g-1", "g-2"];
    pub const OPENROUTER_KEY: &str = "or-1";
}

/// Provider file used by most tests. Every base URL lives on `uri`.
pub fn providers_yaml(uri: &str) -> String {
    format!(
        r#"
openai:
  base_url: "{uri}/openai/v1/"
  keys:
    - sk-a
    - sk-b
    - sk-c
gemini:
  base_url: "{uri}/gemini/"
  keys: "g-1, g-2"
openrouter:
  base_url: "{uri}/openrouter/api/v1/"
  keys: [or-1]
keyless:
  base_url: "{uri}/keyless/"
  keys: ""
unreachable:
  base_url: "http://127.0.0.1:1/"
  keys: [dead-key]
"#
    )
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        providers_path: "config.yaml".into(),
        upstream_timeout_secs: 5,
        max_body_bytes: 1024 * 1024,
        metrics_addr: None,
        json_logs: false,
    }
}

/// Router under test plus the upstream it forwards to
pub struct TestHarness {
    pub server: TestServer,
    pub upstream: MockServer,
    pub state: Arc<AppState>,
}

impl TestHarness {
    /// Harness with the default provider file
    pub async fn new() -> Self {
        let upstream = MockServer::start().await;
        let yaml = providers_yaml(&upstream.uri());
        Self::with_providers(upstream, &yaml)
    }

    /// Harness with a custom provider file
    pub fn with_providers(upstream: MockServer, yaml: &str) -> Self {
        let providers = parse_providers(yaml).expect("Failed to parse test providers");
        let registry = ProviderRegistry::from_config(providers);
        let state = Arc::new(AppState::with_client(
            test_config(),
            registry,
            reqwest::Client::new(),
        ));

        let app = create_router(state.clone());
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            upstream,
            state,
        }
    }
}
