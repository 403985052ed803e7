//! Remote verification flow.

use std::sync::Arc;
use std::time::Instant;

use super::{Classifier, VerificationResult};
use crate::config::VerificationConfig;
use crate::metrics::MetricsRegistry;
use crate::registry::{NetworkError, RegistrySource};
use crate::types::{MediaFingerprint, RegisteredMedia};

/// A classification together with the records it was computed against.
///
/// `result.matched_index` indexes into `candidates`.
#[derive(Clone, Debug, PartialEq)]
pub struct Verification {
    pub result: VerificationResult,
    pub candidates: Vec<RegisteredMedia>,
}

/// Verifies fingerprints through a [`RegistrySource`].
///
/// The verify-by-hash endpoint is asked first. Only when it returns no
/// registrant, and the query has a perceptual hash, is the full listing
/// fetched for the similarity fallback.
pub struct Verifier<R> {
    registry: R,
    classifier: Classifier,
    check_onchain: bool,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl<R: RegistrySource> Verifier<R> {
    pub fn new(registry: R, cfg: &VerificationConfig) -> Self {
        Self {
            registry,
            classifier: Classifier::from_config(cfg),
            check_onchain: cfg.check_onchain,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub async fn verify(&self, query: &MediaFingerprint) -> Result<Verification, NetworkError> {
        let start = Instant::now();
        let outcome = self.verify_inner(query).await;

        if let Some(metrics) = &self.metrics {
            match &outcome {
                Ok(v) => metrics
                    .verification
                    .record_outcome(v.result.status, start.elapsed().as_secs_f64()),
                Err(_) => metrics.verification.registry_network_errors.inc(),
            }
        }
        outcome
    }

    async fn verify_inner(&self, query: &MediaFingerprint) -> Result<Verification, NetworkError> {
        let by_hash = self
            .registry
            .registrants_by_hash(&query.sha256_hash, self.check_onchain)
            .await?;

        if !by_hash.registrants.is_empty() {
            // Registrants are matched by content key and may omit the hash itself.
            let hex = query.sha256_hash.to_hex();
            let candidates: Vec<RegisteredMedia> = by_hash
                .registrants
                .into_iter()
                .map(|mut r| {
                    r.sha256_hash.get_or_insert_with(|| hex.clone());
                    r
                })
                .collect();
            let result = self
                .classifier
                .classify(query, &candidates, by_hash.onchain.as_deref());
            if result.sha256_match || query.perceptual_hash.is_none() {
                tracing::info!(
                    sha256 = %query.sha256_hash,
                    status = result.status.as_str(),
                    registrants = candidates.len(),
                    "verified by content hash"
                );
                return Ok(Verification { result, candidates });
            }
            // Registrants whose stored hash disagrees with the query say
            // nothing about the rest of the registry.
            tracing::debug!(
                sha256 = %query.sha256_hash,
                registrants = candidates.len(),
                "registrants carry no exact hash match, checking the full listing"
            );
        }

        let candidates = if query.perceptual_hash.is_some() {
            self.registry.list_registrations().await?
        } else {
            Vec::new()
        };
        let result = self.classifier.classify(query, &candidates, None);
        tracing::info!(
            sha256 = %query.sha256_hash,
            status = result.status.as_str(),
            similarity = ?result.phash_similarity,
            candidates = candidates.len(),
            "verified by perceptual similarity"
        );
        Ok(Verification { result, candidates })
    }
}
