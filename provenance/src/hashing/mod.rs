//! Fingerprinting of uploaded media.
//!
//! A fingerprint is the pair of:
//!
//! - the SHA-256 of the exact bytes (`content`), and
//! - a 64-bit average hash of the decoded image (`perceptual`), when the
//!   bytes decode as an image.
//!
//! Both are pure functions of the input bytes; the only suspension point is
//! reading a file in [`fingerprint_path`].

pub mod content;
pub mod perceptual;

use std::path::{Path, PathBuf};

pub use content::compute_content_hash;
pub use perceptual::{compute_perceptual_hash, try_perceptual_hash};

use crate::types::MediaFingerprint;

/// Errors raised while fingerprinting.
#[derive(Debug, thiserror::Error)]
pub enum HashingError {
    /// The file could not be read at all.
    #[error("failed to read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The bytes are not a decodable image.
    #[error("image decode failed: {0}")]
    Decode(String),
}

/// Fingerprints an in-memory upload.
///
/// Non-image content still gets a content hash; its perceptual hash is `None`.
pub fn fingerprint_bytes(bytes: &[u8]) -> MediaFingerprint {
    MediaFingerprint {
        sha256_hash: compute_content_hash(bytes),
        perceptual_hash: compute_perceptual_hash(bytes),
    }
}

/// Reads `path` and fingerprints its contents.
pub async fn fingerprint_path(path: impl AsRef<Path>) -> Result<MediaFingerprint, HashingError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| HashingError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let fingerprint = fingerprint_bytes(&bytes);
    tracing::debug!(
        path = %path.display(),
        sha256 = %fingerprint.sha256_hash,
        has_phash = fingerprint.perceptual_hash.is_some(),
        "fingerprinted file"
    );
    Ok(fingerprint)
}
