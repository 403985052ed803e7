//! Access to the external registry and chain-proxy service.
//!
//! The registry owns all durable state ([`RegisteredMedia`] records and
//! their on-chain anchors). This crate only reaches it through the HTTP
//! contracts modelled by the traits below; [`HttpRegistryClient`] is the
//! concrete `reqwest` implementation.

pub mod http;

use std::future::Future;

use serde::{Deserialize, Serialize};

pub use http::HttpRegistryClient;

use crate::types::{ContentHash, OnchainPresence, RegisteredMedia};

/// Errors raised by calls to the registry service.
///
/// Every variant carries the endpoint so callers can report or retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// Transport failure: connection refused, DNS, timeout.
    #[error("request to {endpoint} failed: {message}")]
    Unreachable { endpoint: String, message: String },
    /// The service answered with a non-2xx status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The body could not be parsed or failed validation.
    #[error("unexpected response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },
}

impl NetworkError {
    pub fn endpoint(&self) -> &str {
        match self {
            NetworkError::Unreachable { endpoint, .. }
            | NetworkError::Status { endpoint, .. }
            | NetworkError::InvalidResponse { endpoint, .. } => endpoint,
        }
    }
}

/// Response of the verify-by-hash endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrantsResponse {
    /// Registrations whose content key matches the queried hash.
    #[serde(default)]
    pub registrants: Vec<RegisteredMedia>,
    /// Per-registration on-chain presence, only when `check_onchain` was set.
    #[serde(default)]
    pub onchain: Option<Vec<OnchainPresence>>,
    /// Hex content key the service matched on.
    #[serde(default)]
    pub content_key: Option<String>,
}

/// Receipt returned by the broadcast endpoint.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BroadcastReceipt {
    pub txid: String,
    #[serde(default)]
    pub explorer_url: Option<String>,
}

/// Read access to registered media.
pub trait RegistrySource: Send + Sync {
    /// Registrations for one content hash, optionally with on-chain checks.
    fn registrants_by_hash(
        &self,
        hash: &ContentHash,
        check_onchain: bool,
    ) -> impl Future<Output = Result<RegistrantsResponse, NetworkError>> + Send;

    /// Full registry listing, in the service's order.
    fn list_registrations(
        &self,
    ) -> impl Future<Output = Result<Vec<RegisteredMedia>, NetworkError>> + Send;
}

/// Submission of signed transactions.
pub trait Broadcaster: Send + Sync {
    fn broadcast(
        &self,
        signed_tx_b64: &str,
    ) -> impl Future<Output = Result<BroadcastReceipt, NetworkError>> + Send;
}
