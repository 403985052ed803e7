//! Provenance library crate.
//!
//! This crate provides the core building blocks for registering and
//! verifying digital media against an Algorand-anchored registry:
//!
//! - strongly-typed domain types (`types`),
//! - content and perceptual fingerprinting (`hashing`),
//! - base64 handling for transaction payloads (`codec`),
//! - payment construction and signed-transaction normalization (`algod`),
//! - the registry HTTP client (`registry`),
//! - tiered verification (`verification`) and lineage graphs (`lineage`),
//! - Prometheus-based metrics (`metrics`),
//! - and a top-level configuration (`config`).
//!
//! Signing is never done here: transactions are built unsigned, handed to
//! an external wallet, and the wallet's output is normalized for broadcast.

pub mod algod;
pub mod codec;
pub mod config;
pub mod error;
pub mod hashing;
pub mod lineage;
pub mod metrics;
pub mod registry;
pub mod types;
pub mod verification;

// Re-export top-level configuration types.
pub use config::{
    ConfigError, MetricsConfig, ProvenanceConfig, RegistryClientConfig, RegistryEndpoints,
    VerificationConfig,
};

pub use error::{Error, Result};

// Fingerprinting and codec entry points.
pub use codec::{CodecError, base64_to_bytes, bytes_to_base64, normalize_base64};
pub use hashing::{
    HashingError, compute_content_hash, compute_perceptual_hash, fingerprint_bytes,
    fingerprint_path,
};

// Transaction building and normalization.
pub use algod::{
    AddressRole, NormalizeError, NormalizedTxn, ParamsSource, SignedTxn, TransactionBuilder,
    TxnError,
};

// Registry access.
pub use registry::{
    BroadcastReceipt, Broadcaster, HttpRegistryClient, NetworkError, RegistrantsResponse,
    RegistrySource,
};

// Verification and lineage.
pub use lineage::{LineageGraph, LineageRecords};
pub use verification::{Classifier, Verification, VerificationResult, VerificationStatus, Verifier};

pub use metrics::{MetricsRegistry, VerificationMetrics};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Builder wired to the HTTP registry client.
pub type DefaultTransactionBuilder = TransactionBuilder<HttpRegistryClient>;

/// Verifier wired to the HTTP registry client.
pub type DefaultVerifier = Verifier<HttpRegistryClient>;
