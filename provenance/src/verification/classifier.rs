//! Tiered verification decision: exact hash, then perceptual similarity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::similarity::similarity_percent;
use crate::config::VerificationConfig;
use crate::types::{MediaFingerprint, OnchainPresence, RegisteredMedia};

/// Outcome of a classification.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Byte-identical content is registered.
    Verified,
    /// A perceptually similar registration exists.
    Similar,
    NotFound,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::Similar => "similar",
            VerificationStatus::NotFound => "not_found",
        }
    }
}

/// Result of [`Classifier::classify`].
///
/// `onchain` is advisory: it annotates an exact match and never changes
/// `status`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub status: VerificationStatus,
    #[serde(rename = "sha256Match")]
    pub sha256_match: bool,
    #[serde(rename = "pHashMatch")]
    pub phash_match: bool,
    /// Integer percentage against the matched (or best) candidate.
    #[serde(rename = "pHashSimilarity")]
    pub phash_similarity: Option<u8>,
    pub revoked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onchain: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched: Option<RegisteredMedia>,
    /// Index of `matched` in the registry slice that was classified.
    #[serde(skip)]
    pub matched_index: Option<usize>,
}

impl VerificationResult {
    fn not_found(best_similarity: Option<u8>) -> Self {
        Self {
            status: VerificationStatus::NotFound,
            sha256_match: false,
            phash_match: false,
            phash_similarity: best_similarity,
            revoked: false,
            onchain: None,
            matched: None,
            matched_index: None,
        }
    }
}

/// Pure classifier over an in-memory registry snapshot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Classifier {
    threshold: u8,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(VerificationConfig::DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl Classifier {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn from_config(cfg: &VerificationConfig) -> Self {
        Self::new(cfg.similarity_threshold)
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Classifies `query` against `registry`.
    ///
    /// 1. The first record whose SHA-256 equals the query's is an exact
    ///    match (`verified`); similarity is filled in for display only.
    /// 2. Otherwise, when the query has a perceptual hash, the record with
    ///    the highest similarity is the candidate. Ties keep the earliest
    ///    record in registry order.
    /// 3. The candidate is `similar` when its similarity is strictly above
    ///    the threshold; anything else is `not_found`.
    ///
    /// `onchain` is merged only into exact matches.
    pub fn classify(
        &self,
        query: &MediaFingerprint,
        registry: &[RegisteredMedia],
        onchain: Option<&[OnchainPresence]>,
    ) -> VerificationResult {
        if let Some(idx) = registry
            .iter()
            .position(|r| r.content_hash() == Some(query.sha256_hash))
        {
            let rec = &registry[idx];
            let phash_similarity = query
                .perceptual_hash
                .as_ref()
                .zip(rec.perceptual())
                .map(|(q, r)| similarity_percent(q, &r));

            tracing::debug!(sha256 = %query.sha256_hash, index = idx, "exact match");
            return VerificationResult {
                status: VerificationStatus::Verified,
                sha256_match: true,
                phash_match: false,
                phash_similarity,
                revoked: rec.is_revoked(),
                onchain: onchain.map(|list| {
                    list.iter()
                        .map(|p| (p.unique_reg_key.clone(), p.onchain_present))
                        .collect()
                }),
                matched: Some(rec.clone()),
                matched_index: Some(idx),
            };
        }

        let Some(query_phash) = query.perceptual_hash.as_ref() else {
            return VerificationResult::not_found(None);
        };

        let mut best: Option<(usize, u8)> = None;
        for (idx, rec) in registry.iter().enumerate() {
            let Some(candidate) = rec.perceptual() else {
                continue;
            };
            let sim = similarity_percent(query_phash, &candidate);
            if best.is_none_or(|(_, b)| sim > b) {
                best = Some((idx, sim));
            }
        }

        match best {
            Some((idx, sim)) if sim > self.threshold => {
                let rec = &registry[idx];
                tracing::debug!(index = idx, similarity = sim, "perceptual match");
                VerificationResult {
                    status: VerificationStatus::Similar,
                    sha256_match: false,
                    phash_match: true,
                    phash_similarity: Some(sim),
                    revoked: rec.is_revoked(),
                    onchain: None,
                    matched: Some(rec.clone()),
                    matched_index: Some(idx),
                }
            }
            best => VerificationResult::not_found(best.map(|(_, sim)| sim)),
        }
    }
}
