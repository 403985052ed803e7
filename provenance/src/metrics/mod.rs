//! Metrics and instrumentation for verification.
//!
//! This module defines Prometheus-compatible metrics for the verification
//! pipeline. Rendering is left to the host: the API gateway serves
//! [`MetricsRegistry::gather_text`] on `GET /metrics`.
//!
//! Typical usage:
//!
//! ```ignore
//! use std::sync::Arc;
//! use provenance::metrics::MetricsRegistry;
//!
//! let metrics = Arc::new(MetricsRegistry::new()?);
//! let verifier = Verifier::new(client, &cfg.verification).with_metrics(metrics.clone());
//!
//! // Elsewhere:
//! let body = metrics.gather_text();
//! ```

pub mod prometheus;

pub use prometheus::{MetricsRegistry, VerificationMetrics};
