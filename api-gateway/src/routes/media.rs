use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde::Serialize;

use provenance::{
    LineageGraph, MediaFingerprint, Verification, VerificationResult, VerificationStatus,
    fingerprint_bytes, lineage,
};

use super::{ApiError, bad_request, upstream};
use crate::state::SharedState;

/// Response body for `POST /media/verify`.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub fingerprint: MediaFingerprint,
    pub result: VerificationResult,
    pub lineage_graph: Option<LineageGraph>,
}

/// `POST /media/fingerprint`
///
/// Body is the raw file. Returns its SHA-256 and, for images, its aHash.
pub async fn fingerprint(body: Bytes) -> Result<(StatusCode, Json<MediaFingerprint>), ApiError> {
    let fp = fingerprint_upload(body).await?;
    Ok((StatusCode::OK, Json(fp)))
}

/// `POST /media/verify`
///
/// Fingerprints the upload and classifies it against the registry. A
/// lineage graph is attached whenever the file matched something.
pub async fn verify(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<(StatusCode, Json<VerifyResponse>), ApiError> {
    let fp = fingerprint_upload(body).await?;
    let Verification { result, candidates } = state.verifier.verify(&fp).await.map_err(upstream)?;

    let lineage_graph = match result.status {
        VerificationStatus::NotFound => None,
        _ => lineage::from_verification(&fp, &result, &candidates, state.verification.graph_top_k),
    };

    Ok((
        StatusCode::OK,
        Json(VerifyResponse {
            fingerprint: fp,
            result,
            lineage_graph,
        }),
    ))
}

async fn fingerprint_upload(body: Bytes) -> Result<MediaFingerprint, ApiError> {
    if body.is_empty() {
        return Err(bad_request("empty upload"));
    }
    // Image decoding is CPU bound.
    tokio::task::spawn_blocking(move || fingerprint_bytes(&body))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("fingerprinting failed: {e}")))
}

#[cfg(test)]
mod tests {
    use axum::{Router, routing::get};
    use serde_json::json;

    use super::*;
    use crate::state::test_support::state_for;
    use provenance::ContentHash;

    const UPLOAD: &[u8] = b"definitely not an image";

    #[tokio::test]
    async fn fingerprint_of_non_image_has_no_perceptual_hash() {
        let (status, Json(fp)) = fingerprint(Bytes::from_static(UPLOAD)).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fp.sha256_hash, ContentHash::compute(UPLOAD));
        assert!(fp.perceptual_hash.is_none());
    }

    #[tokio::test]
    async fn corrupt_png_upload_has_no_perceptual_hash() {
        // Valid PNG signature followed by a truncated IHDR chunk.
        const CORRUPT: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR\x00\x00";
        let (status, Json(fp)) = fingerprint(Bytes::from_static(CORRUPT)).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fp.sha256_hash, ContentHash::compute(CORRUPT));
        assert!(fp.perceptual_hash.is_none());
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let (status, _) = fingerprint(Bytes::new()).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn exact_match_is_verified_with_lineage() {
        let hex = ContentHash::compute(UPLOAD).to_hex();
        let router = Router::new().route(
            "/media/registrants",
            get(move || {
                let hex = hex.clone();
                async move {
                    Json(json!({
                        "registrants": [
                            { "sha256_hash": hex, "status": "verified", "signer_address": "SIGNER" }
                        ]
                    }))
                }
            }),
        );
        let state = state_for(router).await;

        let (_, Json(resp)) = verify(State(state), Bytes::from_static(UPLOAD)).await.unwrap();
        assert_eq!(resp.result.status, VerificationStatus::Verified);
        assert!(resp.result.sha256_match);

        let graph = resp.lineage_graph.expect("lineage graph");
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.query_id, lineage::QUERY_NODE_ID);
    }

    #[tokio::test]
    async fn unknown_non_image_is_not_found() {
        let router = Router::new().route(
            "/media/registrants",
            get(|| async { Json(json!({ "registrants": [] })) }),
        );
        let state = state_for(router).await;

        let (_, Json(resp)) = verify(State(state), Bytes::from_static(UPLOAD)).await.unwrap();
        assert_eq!(resp.result.status, VerificationStatus::NotFound);
        assert!(resp.lineage_graph.is_none());
    }

    #[tokio::test]
    async fn registry_failure_is_a_bad_gateway() {
        let router = Router::new().route(
            "/media/registrants",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let state = state_for(router).await;

        let (status, _) = verify(State(state.clone()), Bytes::from_static(UPLOAD))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(state.metrics.verification.registry_network_errors.get(), 1);
    }
}
