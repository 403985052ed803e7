//! Exact-content hashing.

use crate::types::ContentHash;

/// SHA-256 of the raw file bytes. Identical bytes always give identical hashes.
pub fn compute_content_hash(bytes: &[u8]) -> ContentHash {
    ContentHash::compute(bytes)
}
