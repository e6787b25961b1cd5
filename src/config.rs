//! Configuration management for API Router
//!
//! Process settings come from environment variables. The provider table is
//! loaded once at startup from a YAML file.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Path of the YAML provider file
    pub providers_path: PathBuf,

    /// Upper bound on a single upstream call, including streamed bodies
    pub upstream_timeout_secs: u64,

    /// Largest inbound body accepted for forwarding
    pub max_body_bytes: usize,

    /// Separate listener for the Prometheus endpoint
    pub metrics_addr: Option<SocketAddr>,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("API_ROUTER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("API_ROUTER_PORT")
                .unwrap_or_else(|_| "9999".to_string())
                .parse()
                .context("Invalid API_ROUTER_PORT")?,

            providers_path: env::var("API_ROUTER_CONFIG")
                .unwrap_or_else(|_| "config.yaml".to_string())
                .into(),

            upstream_timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .context("Invalid UPSTREAM_TIMEOUT_SECS")?,

            max_body_bytes: env::var("MAX_BODY_BYTES")
                .unwrap_or_else(|_| (50 * 1024 * 1024).to_string())
                .parse()
                .context("Invalid MAX_BODY_BYTES")?,

            metrics_addr: env::var("METRICS_ADDR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.parse())
                .transpose()
                .context("Invalid METRICS_ADDR")?,

            json_logs: env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }
}

/// Credential keys as written in the provider file.
///
/// Either a YAML list or a single comma-delimited string.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum KeySource {
    List(Vec<String>),
    Joined(String),
}

impl KeySource {
    /// Normalize into an ordered list of trimmed, non-empty keys.
    pub fn into_keys(self) -> Vec<String> {
        match self {
            KeySource::List(keys) => keys
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            KeySource::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl Default for KeySource {
    fn default() -> Self {
        KeySource::List(Vec::new())
    }
}

/// One provider entry of the YAML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderEntry {
    /// URL prefix the forwarded path is appended to
    #[serde(default)]
    pub base_url: Option<String>,
    /// Credential pool
    #[serde(default, deserialize_with = "nullable_keys")]
    pub keys: KeySource,
}

/// `keys:` with no value means no keys
fn nullable_keys<'de, D>(deserializer: D) -> Result<KeySource, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<KeySource>::deserialize(deserializer)?.unwrap_or_default())
}

/// Provider file contents, keyed by routing name
pub type ProvidersFile = BTreeMap<String, ProviderEntry>;

/// Read and parse the provider file.
///
/// A missing file is a fatal startup condition.
pub fn load_providers(path: &Path) -> Result<ProvidersFile> {
    if !path.exists() {
        bail!("Config file not found: {}", path.display());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_providers(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse provider YAML after expanding `${VAR}` references.
pub fn parse_providers(content: &str) -> Result<ProvidersFile> {
    let expanded = expand_env_vars(content);

    // An empty document deserializes to unit, not a map
    if expanded.trim().is_empty() {
        return Ok(ProvidersFile::new());
    }

    let providers: Option<ProvidersFile> = serde_yaml::from_str(&expanded)?;
    Ok(providers.unwrap_or_default())
}

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("valid env var pattern")
});

/// Expand `${VAR}` and `${VAR:-default}` from the process environment.
///
/// Unset variables without a default expand to the empty string.
fn expand_env_vars(content: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(content, |caps: &Captures| {
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            env::var(&caps[1]).unwrap_or_else(|_| default.to_string())
        })
        .into_owned()
}
