use axum::{Json, http::StatusCode};
use serde::{Deserialize, Serialize};

use provenance::ContentHash;

use super::{ApiError, bad_request};

/// Request body for `POST /keys/derive`.
#[derive(Debug, Deserialize)]
pub struct DeriveKeysRequest {
    /// Hex-encoded SHA-256 of the media bytes.
    pub sha256_hash: String,
    /// Usually the id of the anchoring payment transaction.
    #[serde(default)]
    pub nonce: Option<String>,
}

/// Response body for `POST /keys/derive`.
#[derive(Debug, Serialize)]
pub struct DeriveKeysResponse {
    pub content_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_reg_key: Option<String>,
}

/// `POST /keys/derive`
///
/// Recomputes the registry keys for a content hash.
pub async fn derive_keys(
    Json(body): Json<DeriveKeysRequest>,
) -> Result<(StatusCode, Json<DeriveKeysResponse>), ApiError> {
    let hash = ContentHash::from_hex(&body.sha256_hash).map_err(bad_request)?;
    let key = hash.content_key();

    Ok((
        StatusCode::OK,
        Json(DeriveKeysResponse {
            content_key: key.to_hex(),
            unique_reg_key: body.nonce.as_deref().map(|n| key.registration_key(n).to_hex()),
        }),
    ))
}
