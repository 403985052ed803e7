//! Prometheus-backed metrics.
//!
//! [`MetricsRegistry`] owns a Prometheus registry and the strongly-typed
//! [`VerificationMetrics`] recorded by the verifier and the gateway.

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

use crate::verification::VerificationStatus;

/// Verification-related Prometheus metrics.
#[derive(Clone)]
pub struct VerificationMetrics {
    /// End-to-end latency of one verification, registry calls included.
    pub classify_seconds: Histogram,
    /// Verification outcomes, labelled by `status`.
    pub outcomes: IntCounterVec,
    /// Signed transactions that went through the JSON fallback.
    pub encoding_fallbacks: IntCounter,
    /// Failed calls to the registry service.
    pub registry_network_errors: IntCounter,
}

impl VerificationMetrics {
    /// Registers verification metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let classify_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "verification_classify_seconds",
                "Time to verify one fingerprint against the registry in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
        )?;
        registry.register(Box::new(classify_seconds.clone()))?;

        let outcomes = IntCounterVec::new(
            Opts::new(
                "verification_outcomes_total",
                "Verification results by status (verified, similar, not_found)",
            ),
            &["status"],
        )?;
        registry.register(Box::new(outcomes.clone()))?;

        let encoding_fallbacks = IntCounter::with_opts(Opts::new(
            "signed_txn_encoding_fallbacks_total",
            "Signed transactions normalized through the JSON fallback",
        ))?;
        registry.register(Box::new(encoding_fallbacks.clone()))?;

        let registry_network_errors = IntCounter::with_opts(Opts::new(
            "registry_network_errors_total",
            "Failed requests to the registry service",
        ))?;
        registry.register(Box::new(registry_network_errors.clone()))?;

        Ok(Self {
            classify_seconds,
            outcomes,
            encoding_fallbacks,
            registry_network_errors,
        })
    }

    pub fn record_outcome(&self, status: VerificationStatus, elapsed_secs: f64) {
        self.classify_seconds.observe(elapsed_secs);
        self.outcomes.with_label_values(&[status.as_str()]).inc();
    }
}

/// Wrapper around a Prometheus registry and the verification metrics.
///
/// Cheap to clone; usually shared behind an [`std::sync::Arc`].
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub verification: VerificationMetrics,
}

impl MetricsRegistry {
    /// Creates a fresh registry with the `provenance` namespace.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("provenance".to_string()), None)?;
        let verification = VerificationMetrics::register(&registry)?;
        Ok(Self {
            registry,
            verification,
        })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_metrics_register_and_record() {
        let registry = Registry::new();
        let metrics = VerificationMetrics::register(&registry).expect("register metrics");

        metrics.record_outcome(VerificationStatus::Similar, 0.02);
        metrics.encoding_fallbacks.inc();
        metrics.registry_network_errors.inc();

        assert_eq!(metrics.outcomes.with_label_values(&["similar"]).get(), 1);
        assert_eq!(metrics.classify_seconds.get_sample_count(), 1);
        assert!(!registry.gather().is_empty());
    }

    #[test]
    fn gather_text_uses_the_namespace() {
        let metrics = MetricsRegistry::new().expect("create metrics registry");
        metrics
            .verification
            .record_outcome(VerificationStatus::NotFound, 0.01);
        let text = metrics.gather_text();
        assert!(text.contains("provenance_verification_classify_seconds"));
        assert!(text.contains("status=\"not_found\""));
    }

    #[test]
    fn registering_twice_fails() {
        let registry = Registry::new();
        VerificationMetrics::register(&registry).expect("first registration");
        assert!(VerificationMetrics::register(&registry).is_err());
    }
}
