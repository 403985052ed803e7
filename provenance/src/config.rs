//! Top-level configuration for the provenance engine.
//!
//! This module aggregates configuration for:
//!
//! - the registry HTTP client (base URL, timeout, endpoint paths),
//! - the verification policy (similarity threshold, on-chain checks,
//!   lineage neighbour count),
//! - metrics collection.
//!
//! Every section has a `Default`; [`ProvenanceConfig::from_env`] applies
//! `PROVENANCE_*` overrides on top.

use std::time::Duration;

/// Error returned when an override cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Paths of the registry service endpoints, relative to the base URL.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistryEndpoints {
    pub suggested_params: String,
    pub broadcast: String,
    pub registrants: String,
    pub registrations: String,
}

impl Default for RegistryEndpoints {
    fn default() -> Self {
        Self {
            suggested_params: "/media/algod_params".to_string(),
            broadcast: "/media/broadcast_signed_tx".to_string(),
            registrants: "/media/registrants".to_string(),
            registrations: "/api/registrations".to_string(),
        }
    }
}

/// Configuration for the registry HTTP client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistryClientConfig {
    /// Base URL of the registry service, e.g. `"http://127.0.0.1:8000"`.
    pub base_url: String,
    /// Upper bound for every request, connect included.
    pub timeout: Duration,
    pub endpoints: RegistryEndpoints,
}

impl Default for RegistryClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout: Duration::from_secs(5),
            endpoints: RegistryEndpoints::default(),
        }
    }
}

/// Verification policy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerificationConfig {
    /// A perceptual candidate is `similar` only when its rounded similarity
    /// is strictly greater than this percentage.
    pub similarity_threshold: u8,
    /// Ask the registry to confirm exact matches on-chain.
    pub check_onchain: bool,
    /// Number of perceptual neighbours added to lineage graphs.
    pub graph_top_k: usize,
}

impl VerificationConfig {
    pub const DEFAULT_SIMILARITY_THRESHOLD: u8 = 90;
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: Self::DEFAULT_SIMILARITY_THRESHOLD,
            check_onchain: false,
            graph_top_k: 8,
        }
    }
}

/// Configuration for Prometheus metrics.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProvenanceConfig {
    pub registry: RegistryClientConfig,
    pub verification: VerificationConfig,
    pub metrics: MetricsConfig,
}

impl ProvenanceConfig {
    /// Defaults overridden by `PROVENANCE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(url) = lookup("PROVENANCE_REGISTRY_URL") {
            let url = url.trim();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid(
                    "PROVENANCE_REGISTRY_URL",
                    url,
                    "expected an http(s) URL",
                ));
            }
            cfg.registry.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("PROVENANCE_REGISTRY_TIMEOUT_MS") {
            let ms: u64 = parse_num("PROVENANCE_REGISTRY_TIMEOUT_MS", &raw)?;
            if ms == 0 {
                return Err(invalid(
                    "PROVENANCE_REGISTRY_TIMEOUT_MS",
                    &raw,
                    "timeout must be positive",
                ));
            }
            cfg.registry.timeout = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("PROVENANCE_SIMILARITY_THRESHOLD") {
            let pct: u8 = parse_num("PROVENANCE_SIMILARITY_THRESHOLD", &raw)?;
            if pct > 100 {
                return Err(invalid(
                    "PROVENANCE_SIMILARITY_THRESHOLD",
                    &raw,
                    "expected a percentage in 0..=100",
                ));
            }
            cfg.verification.similarity_threshold = pct;
        }
        if let Some(raw) = lookup("PROVENANCE_CHECK_ONCHAIN") {
            cfg.verification.check_onchain = parse_bool("PROVENANCE_CHECK_ONCHAIN", &raw)?;
        }
        if let Some(raw) = lookup("PROVENANCE_GRAPH_TOP_K") {
            cfg.verification.graph_top_k = parse_num("PROVENANCE_GRAPH_TOP_K", &raw)?;
        }
        if let Some(raw) = lookup("PROVENANCE_METRICS_ENABLED") {
            cfg.metrics.enabled = parse_bool("PROVENANCE_METRICS_ENABLED", &raw)?;
        }

        Ok(cfg)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_num<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| invalid(key, raw, e.to_string()))
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw, "expected a boolean")),
    }
}
