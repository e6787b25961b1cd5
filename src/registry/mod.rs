//! Provider registry
//!
//! Holds the base URL and key pool of every configured provider and owns the
//! rotation cursors. No HTTP types live here.

mod rotation;

pub use rotation::KeyRotation;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;

use crate::config::ProvidersFile;

/// Registry lookup failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Provider {0} not supported")]
    UnknownProvider(String),

    #[error("No keys available for provider {0}")]
    NoKeysConfigured(String),
}

/// A single provider as seen by the router
#[derive(Debug)]
struct Provider {
    base_url: Option<String>,
    rotation: KeyRotation,
}

/// All configured providers, keyed by routing name.
///
/// Iteration order is sorted by name so health output is stable.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Provider>,
}

impl ProviderRegistry {
    /// Build the registry from the parsed provider file.
    ///
    /// Key strings are normalized here; every rotation starts at index 0.
    pub fn from_config(file: ProvidersFile) -> Self {
        let providers = file
            .into_iter()
            .map(|(name, entry)| {
                let keys = entry.keys.into_keys();
                if !keys.is_empty() && entry.base_url.is_none() {
                    warn!(provider = %name, "Provider has keys but no base_url configured");
                }
                let provider = Provider {
                    base_url: entry.base_url,
                    rotation: KeyRotation::new(keys),
                };
                (name, provider)
            })
            .collect();

        Self { providers }
    }

    /// Names of every provider with at least one key, sorted.
    pub fn list_active_providers(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter(|(_, p)| !p.rotation.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Whether requests for `provider` may be routed
    pub fn is_active(&self, provider: &str) -> bool {
        self.providers
            .get(provider)
            .is_some_and(|p| !p.rotation.is_empty())
    }

    pub fn base_url(&self, provider: &str) -> Result<&str, RegistryError> {
        self.providers
            .get(provider)
            .and_then(|p| p.base_url.as_deref())
            .ok_or_else(|| RegistryError::UnknownProvider(provider.to_string()))
    }

    /// Dispense the next key for `provider` in round-robin order.
    pub fn next_key(&self, provider: &str) -> Result<&str, RegistryError> {
        let entry = self
            .providers
            .get(provider)
            .ok_or_else(|| RegistryError::UnknownProvider(provider.to_string()))?;

        entry
            .rotation
            .next_key()
            .ok_or_else(|| RegistryError::NoKeysConfigured(provider.to_string()))
    }

    /// Current rotation cursor of `provider`, if configured
    pub fn cursor(&self, provider: &str) -> Option<usize> {
        self.providers.get(provider).map(|p| p.rotation.cursor())
    }
}
