//! Types for registered media records.
//!
//! A [`RegisteredMedia`] entry is created by the registration flow and is
//! owned by the external registry service; this crate only reads it. The
//! only mutation the registry performs is a [`MediaStatus`] transition.

use serde::{Deserialize, Deserializer, Serialize};

use super::{ContentHash, PerceptualHash};

/// Lifecycle status of a registration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    Pending,
    /// Registry default when a record carries no status.
    #[default]
    Verified,
    Revoked,
}

/// Error returned for a status change the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal status transition {from:?} -> {to:?}")]
pub struct StatusTransitionError {
    pub from: MediaStatus,
    pub to: MediaStatus,
}

impl MediaStatus {
    /// Applies a transition, allowing only `pending -> verified`,
    /// `verified -> revoked` and `revoked -> verified` (restore).
    pub fn transition(self, to: MediaStatus) -> Result<MediaStatus, StatusTransitionError> {
        use MediaStatus::*;
        match (self, to) {
            (Pending, Verified) | (Verified, Revoked) | (Revoked, Verified) => Ok(to),
            (from, to) => Err(StatusTransitionError { from, to }),
        }
    }

    fn from_wire(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "verified" => MediaStatus::Verified,
            "revoked" => MediaStatus::Revoked,
            // Anything the registry invents is treated as not yet verified.
            _ => MediaStatus::Pending,
        }
    }
}

impl<'de> Deserialize<'de> for MediaStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(MediaStatus::from_wire).unwrap_or_default())
    }
}

/// One registration as returned by the registry service.
///
/// Hash fields are kept as the registry's raw strings; use
/// [`RegisteredMedia::content_hash`] and
/// [`RegisteredMedia::perceptual`] to obtain typed values. A record whose
/// hashes do not parse simply does not match anything.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisteredMedia {
    #[serde(default)]
    pub sha256_hash: Option<String>,
    #[serde(default)]
    pub perceptual_hash: Option<String>,
    #[serde(default)]
    pub ipfs_cid: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,

    #[serde(default)]
    pub ai_model: Option<String>,
    #[serde(default)]
    pub generation_time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub signer_address: Option<String>,

    #[serde(default)]
    pub algo_tx: Option<String>,
    #[serde(default)]
    pub unique_reg_key: Option<String>,

    #[serde(default)]
    pub status: MediaStatus,
}

impl RegisteredMedia {
    /// Parsed SHA-256 hash, if present and well-formed.
    pub fn content_hash(&self) -> Option<ContentHash> {
        self.sha256_hash
            .as_deref()
            .and_then(|s| ContentHash::from_hex(s).ok())
    }

    /// Parsed perceptual hash, if present and well-formed.
    pub fn perceptual(&self) -> Option<PerceptualHash> {
        self.perceptual_hash
            .as_deref()
            .and_then(|s| PerceptualHash::parse(s).ok())
    }

    pub fn is_revoked(&self) -> bool {
        self.status == MediaStatus::Revoked
    }

    /// Stable identifier used for graph nodes and logs.
    ///
    /// Prefers `unique_reg_key`, then the content hash, then the CID.
    pub fn display_id(&self) -> Option<&str> {
        self.unique_reg_key
            .as_deref()
            .or(self.sha256_hash.as_deref())
            .or(self.ipfs_cid.as_deref())
    }
}

/// Result of a remote on-chain presence check for one registration key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OnchainPresence {
    pub unique_reg_key: String,
    pub onchain_present: bool,
}
