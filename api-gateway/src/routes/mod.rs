//! HTTP route handlers.
//!
//! Handlers return `Result<(StatusCode, Json<_>), ApiError>`; the helpers
//! below map library errors onto status codes.

use std::fmt::Display;

use axum::http::StatusCode;

use provenance::NetworkError;

pub mod health;
pub mod keys;
pub mod media;
pub mod txn;

/// Status and plain-text message returned to the client.
pub type ApiError = (StatusCode, String);

fn bad_request(msg: impl Display) -> ApiError {
    (StatusCode::BAD_REQUEST, msg.to_string())
}

fn unprocessable(msg: impl Display) -> ApiError {
    (StatusCode::UNPROCESSABLE_ENTITY, msg.to_string())
}

/// Registry failures surface as `502 Bad Gateway`.
fn upstream(err: NetworkError) -> ApiError {
    tracing::warn!(endpoint = err.endpoint(), error = %err, "registry request failed");
    (StatusCode::BAD_GATEWAY, err.to_string())
}
