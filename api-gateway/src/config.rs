//! API gateway configuration.
//!
//! Only the HTTP surface is configured here. Registry, verification and
//! metrics settings come from `provenance::ProvenanceConfig::from_env()`.

use std::net::{Ipv4Addr, SocketAddr};

use provenance::ConfigError;

/// Configuration for the API gateway HTTP server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    /// Largest accepted upload for the media routes, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        // Bind to all interfaces so the container port mapping (8081->8081) is reachable
        // from the host when running under docker-compose.
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8081)),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl ApiConfig {
    /// Defaults overridden by `API_LISTEN_ADDR` and `API_MAX_UPLOAD_BYTES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(raw) = lookup("API_LISTEN_ADDR") {
            cfg.listen_addr = raw.trim().parse().map_err(|e| ConfigError {
                key: "API_LISTEN_ADDR",
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
        }
        if let Some(raw) = lookup("API_MAX_UPLOAD_BYTES") {
            let bytes: usize = raw.trim().parse().map_err(|e| ConfigError {
                key: "API_MAX_UPLOAD_BYTES",
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
            if bytes == 0 {
                return Err(ConfigError {
                    key: "API_MAX_UPLOAD_BYTES",
                    value: raw,
                    reason: "limit must be positive".to_string(),
                });
            }
            cfg.max_upload_bytes = bytes;
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listens_on_8081() {
        let cfg = ApiConfig::default();
        assert_eq!(cfg.listen_addr.port(), 8081);
        assert!(cfg.listen_addr.ip().is_unspecified());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = ApiConfig::from_lookup(|key| match key {
            "API_LISTEN_ADDR" => Some("127.0.0.1:9000".to_string()),
            "API_MAX_UPLOAD_BYTES" => Some("1024".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.listen_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(cfg.max_upload_bytes, 1024);
    }

    #[test]
    fn bad_overrides_name_the_key() {
        let err = ApiConfig::from_lookup(|key| {
            (key == "API_LISTEN_ADDR").then(|| "localhost".to_string())
        })
        .unwrap_err();
        assert_eq!(err.key, "API_LISTEN_ADDR");

        let err = ApiConfig::from_lookup(|key| {
            (key == "API_MAX_UPLOAD_BYTES").then(|| "0".to_string())
        })
        .unwrap_err();
        assert_eq!(err.key, "API_MAX_UPLOAD_BYTES");
    }
}
