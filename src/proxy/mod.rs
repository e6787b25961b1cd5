//! Proxy module
//!
//! Handles request forwarding to upstream providers.

pub mod forwarder;
pub mod headers;
pub mod logging;
pub mod policy;

pub use forwarder::{
    ForwardOutcome, ForwardingEngine, InboundRequest, OutboundBody, OutboundRequest,
    RelayedResponse, ResponseBody,
};
pub use policy::{CredentialPlacement, ProviderPolicy};
