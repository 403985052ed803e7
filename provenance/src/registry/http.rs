//! HTTP client for the registry / chain-proxy service.
//!
//! The service exposes a JSON API of the form:
//!
//! ```json
//! GET /media/algod_params
//! { "fee": 0, "minFee": 1000, "firstRound": 100, "lastRound": 1100,
//!   "genesisID": "testnet-v1.0", "genesisHash": "<base64>", "flatFee": false }
//!
//! POST /media/broadcast_signed_tx
//! { "signed_tx_b64": "<base64>" }  ->  { "txid": "...", "explorer_url": "..." }
//!
//! GET /media/registrants?sha256_hash=<hex>&check_onchain=true
//! { "registrants": [ ... ], "onchain": [ { "unique_reg_key": "...", "onchain_present": true } ] }
//!
//! GET /api/registrations
//! [ { "sha256_hash": "...", "perceptual_hash": "...", ... } ]
//! ```
//!
//! Endpoint paths are configurable through [`RegistryEndpoints`].

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{BroadcastReceipt, Broadcaster, NetworkError, RegistrantsResponse, RegistrySource};
use crate::algod::ParamsSource;
use crate::codec::{base64_to_bytes, normalize_base64};
use crate::config::{RegistryClientConfig, RegistryEndpoints};
use crate::types::{ContentHash, RegisteredMedia, SuggestedParams};

/// Longest error body kept in [`NetworkError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// `reqwest`-backed registry client.
///
/// Cheap to clone: the underlying connection pool is shared. Every request
/// is bounded by the configured timeout.
#[derive(Clone, Debug)]
pub struct HttpRegistryClient {
    base_url: String,
    client: Client,
    endpoints: RegistryEndpoints,
}

impl HttpRegistryClient {
    pub fn new(cfg: &RegistryClientConfig) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| NetworkError::Unreachable {
                endpoint: cfg.base_url.clone(),
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            base_url: cfg.base_url.clone(),
            client,
            endpoints: cfg.endpoints.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        url: &str,
        request: RequestBuilder,
    ) -> Result<T, NetworkError> {
        let resp = request.send().await.map_err(|e| NetworkError::Unreachable {
            endpoint: url.to_string(),
            message: e.to_string(),
        })?;
        let resp = check_status(url, resp).await?;
        resp.json::<T>().await.map_err(|e| NetworkError::InvalidResponse {
            endpoint: url.to_string(),
            message: format!("failed to parse JSON response: {e}"),
        })
    }
}

async fn check_status(url: &str, resp: Response) -> Result<Response, NetworkError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let mut body = resp.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(NetworkError::Status {
        endpoint: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Wire form of the suggested-params response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParamsResponse {
    fee: u64,
    #[serde(default)]
    min_fee: Option<u64>,
    first_round: u64,
    last_round: u64,
    #[serde(rename = "genesisID")]
    genesis_id: String,
    #[serde(default)]
    genesis_hash: Option<String>,
    #[serde(default)]
    genesis_hash_b64: Option<String>,
    #[serde(default)]
    genesis_hash_info: Option<String>,
    #[serde(default)]
    flat_fee: bool,
}

impl ParamsResponse {
    fn into_params(self, endpoint: &str) -> Result<SuggestedParams, NetworkError> {
        let invalid = |message: String| NetworkError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message,
        };

        let gh_b64 = [&self.genesis_hash, &self.genesis_hash_b64, &self.genesis_hash_info]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .ok_or_else(|| invalid("missing genesis hash".to_string()))?;
        let gh = base64_to_bytes(gh_b64).map_err(|e| invalid(format!("genesis hash: {e}")))?;
        let genesis_hash: [u8; 32] = gh
            .as_slice()
            .try_into()
            .map_err(|_| invalid(format!("genesis hash is {} bytes, expected 32", gh.len())))?;

        if self.last_round < self.first_round {
            return Err(invalid(format!(
                "validity window is empty: last round {} < first round {}",
                self.last_round, self.first_round
            )));
        }

        Ok(SuggestedParams {
            fee: self.fee,
            min_fee: self.min_fee.unwrap_or(SuggestedParams::DEFAULT_MIN_FEE),
            first_valid: self.first_round,
            last_valid: self.last_round,
            genesis_id: self.genesis_id,
            genesis_hash,
            flat_fee: self.flat_fee,
        })
    }
}

#[derive(Debug, Serialize)]
struct BroadcastRequest<'a> {
    signed_tx_b64: &'a str,
}

impl ParamsSource for HttpRegistryClient {
    async fn suggested_params(&self) -> Result<SuggestedParams, NetworkError> {
        let url = self.endpoint(&self.endpoints.suggested_params);
        let body: ParamsResponse = self.send_json(&url, self.client.get(&url)).await?;
        body.into_params(&url)
    }
}

impl Broadcaster for HttpRegistryClient {
    async fn broadcast(&self, signed_tx_b64: &str) -> Result<BroadcastReceipt, NetworkError> {
        let url = self.endpoint(&self.endpoints.broadcast);
        let normalized = normalize_base64(signed_tx_b64);
        let request = self.client.post(&url).json(&BroadcastRequest {
            signed_tx_b64: &normalized,
        });
        let receipt: BroadcastReceipt = self.send_json(&url, request).await?;
        tracing::info!(txid = %receipt.txid, "broadcast signed transaction");
        Ok(receipt)
    }
}

impl RegistrySource for HttpRegistryClient {
    async fn registrants_by_hash(
        &self,
        hash: &ContentHash,
        check_onchain: bool,
    ) -> Result<RegistrantsResponse, NetworkError> {
        let url = self.endpoint(&self.endpoints.registrants);
        let request = self.client.get(&url).query(&[
            ("sha256_hash", hash.to_hex()),
            ("check_onchain", check_onchain.to_string()),
        ]);
        self.send_json(&url, request).await
    }

    async fn list_registrations(&self) -> Result<Vec<RegisteredMedia>, NetworkError> {
        let url = self.endpoint(&self.endpoints.registrations);
        self.send_json(&url, self.client.get(&url)).await
    }
}
