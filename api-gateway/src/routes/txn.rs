use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use provenance::{
    BroadcastReceipt, Broadcaster, NormalizeError, Note, SignedTxn, TxnError, WalletSession,
    base64_to_bytes, bytes_to_base64,
};

use super::{ApiError, bad_request, unprocessable, upstream};
use crate::state::SharedState;

/// Request body for `POST /txn/payment`.
///
/// At most one of `note` (UTF-8 text) and `note_b64` (raw bytes) may be set.
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub from: String,
    pub to: String,
    /// Micro-Algos.
    pub amount: u64,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub note_b64: Option<String>,
}

/// Response body for `POST /txn/payment`.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub txid: String,
    /// Canonical msgpack of the unsigned transaction, for the wallet.
    pub txn_b64: String,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
}

/// Request body for `POST /txn/broadcast`.
#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    /// Whatever the wallet returned from signing.
    pub signed: Value,
    /// Signing account, when the client knows it. Only used for logging.
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// `POST /txn/payment`
///
/// Builds an unsigned registration payment from fresh suggested params.
pub async fn build_payment(
    State(state): State<SharedState>,
    Json(body): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let note = match (body.note, body.note_b64) {
        (Some(_), Some(_)) => return Err(bad_request("set either note or note_b64, not both")),
        (Some(text), None) => Some(Note::Text(text)),
        (None, Some(b64)) => Some(Note::Bytes(base64_to_bytes(&b64).map_err(bad_request)?)),
        (None, None) => None,
    };

    let txn = state
        .builder
        .build_payment(&body.from, &body.to, body.amount, note)
        .await
        .map_err(|e| match e {
            TxnError::Network(e) => upstream(e),
            other => bad_request(other),
        })?;

    tracing::info!(txid = %txn.id(), fee = txn.fee, "built registration payment");

    Ok((
        StatusCode::OK,
        Json(PaymentResponse {
            txid: txn.id(),
            txn_b64: bytes_to_base64(&txn.encode()),
            fee: txn.fee,
            first_valid: txn.first_valid,
            last_valid: txn.last_valid,
        }),
    ))
}

/// `POST /txn/broadcast`
///
/// Normalizes wallet output to base64 and forwards it to the registry.
/// Output that only survived through the JSON fallback is refused.
pub async fn broadcast(
    State(state): State<SharedState>,
    Json(body): Json<BroadcastRequest>,
) -> Result<(StatusCode, Json<BroadcastReceipt>), ApiError> {
    let session = body
        .address
        .as_deref()
        .map(|addr| WalletSession::new(addr, body.provider.as_deref().unwrap_or("unknown")))
        .transpose()
        .map_err(bad_request)?;

    let signed = SignedTxn::from_wallet_json(body.signed).map_err(normalize_error)?;
    let normalized = match &session {
        Some(session) => session.normalize_signed(signed),
        None => signed.normalize(),
    }
    .map_err(normalize_error)?;

    if normalized.fallback_used {
        state.metrics.verification.encoding_fallbacks.inc();
    }
    let b64 = normalized.for_broadcast().map_err(normalize_error)?;

    let receipt = state.registry.broadcast(&b64).await.map_err(upstream)?;
    Ok((StatusCode::OK, Json(receipt)))
}

fn normalize_error(err: NormalizeError) -> ApiError {
    match err {
        NormalizeError::Missing | NormalizeError::ByteOutOfRange { .. } => bad_request(err),
        NormalizeError::UnsupportedSyncConversion | NormalizeError::EncodingFallbackUsed => {
            unprocessable(err)
        }
    }
}
