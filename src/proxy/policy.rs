//! Per-provider forwarding policy
//!
//! Static table of how each known vendor expects its credential and which
//! fixed headers it needs. Providers not listed here get the default policy.
//! Adding a vendor is a table entry, not a new branch in the forwarder.

/// Where the dispensed credential goes on the outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPlacement {
    /// `Authorization: Bearer <key>`
    BearerHeader,
    /// `?<param>=<key>`, no Authorization header
    QueryParam(&'static str),
}

/// Forwarding behaviour for one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderPolicy {
    pub credential: CredentialPlacement,
    /// Headers injected on every request, after the inbound copy.
    /// Names are lowercase.
    pub extra_headers: &'static [(&'static str, &'static str)],
}

impl ProviderPolicy {
    pub const DEFAULT: ProviderPolicy = ProviderPolicy {
        credential: CredentialPlacement::BearerHeader,
        extra_headers: &[],
    };

    /// Policy for `provider`, falling back to [`ProviderPolicy::DEFAULT`].
    pub fn for_provider(provider: &str) -> &'static ProviderPolicy {
        POLICIES
            .iter()
            .find(|(name, _)| *name == provider)
            .map(|(_, policy)| policy)
            .unwrap_or(&Self::DEFAULT)
    }
}

static POLICIES: &[(&str, ProviderPolicy)] = &[
    (
        "gemini",
        ProviderPolicy {
            credential: CredentialPlacement::QueryParam("key"),
            extra_headers: &[],
        },
    ),
    (
        "openrouter",
        ProviderPolicy {
            credential: CredentialPlacement::BearerHeader,
            extra_headers: &[
                ("http-referer", "http://localhost:9999"),
                ("x-title", "API Router"),
            ],
        },
    ),
];

/// Path fragments of endpoints that produce long or incremental responses.
const STREAMING_PATH_MARKERS: &[&str] = &[
    "completions",
    "generateContent",
    "messages",
    "responses",
];

/// Whether the response for `path` is relayed as a stream.
///
/// Plain substring match on the forwarded path.
pub fn is_streaming_path(path: &str) -> bool {
    STREAMING_PATH_MARKERS.iter().any(|marker| path.contains(marker))
}
