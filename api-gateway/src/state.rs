//! Shared application state.

use std::sync::Arc;

use provenance::{
    DefaultTransactionBuilder, DefaultVerifier, HttpRegistryClient, MetricsRegistry,
    ProvenanceConfig, TransactionBuilder, VerificationConfig, Verifier,
};

/// Shared state held by the request handlers.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor.
pub struct AppState {
    /// Registry client used for broadcasting signed transactions.
    pub registry: HttpRegistryClient,
    /// Builds unsigned registration payments from fresh suggested params.
    pub builder: DefaultTransactionBuilder,
    /// Exact/perceptual verification against the registry.
    pub verifier: DefaultVerifier,
    /// Metrics registry shared between the verifier and the API.
    pub metrics: Arc<MetricsRegistry>,
    /// Verification policy, also used for lineage graph size.
    pub verification: VerificationConfig,
}

impl AppState {
    pub fn new(
        cfg: &ProvenanceConfig,
        registry: HttpRegistryClient,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let verifier = Verifier::new(registry.clone(), &cfg.verification).with_metrics(metrics.clone());
        Self {
            builder: TransactionBuilder::new(registry.clone()),
            verifier,
            registry,
            metrics,
            verification: cfg.verification.clone(),
        }
    }
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;
