//! Base64 <-> bytes conversion for transaction payloads.
//!
//! Wallets and backends disagree on base64 flavours: some send URL-safe
//! alphabets, some strip padding, some wrap the payload in a `data:` URL.
//! Every decode therefore goes through [`normalize_base64`] first.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::STANDARD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Error returned when a string is not base64 even after normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid base64: {0}")]
pub struct CodecError(pub String);

/// Standard alphabet, accepts padded or unpadded input and non-zero trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Encodes bytes with the standard padded alphabet.
pub fn bytes_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Canonicalizes a base64-ish string to the standard padded alphabet.
///
/// Trims the input, strips a `data:...,` prefix, removes interior
/// whitespace, maps `-` to `+` and `_` to `/`, then pads with `=` to a
/// multiple of four. Idempotent.
pub fn normalize_base64(s: &str) -> String {
    let mut s = s.trim();
    if s.starts_with("data:") {
        if let Some((_, payload)) = s.split_once(',') {
            s = payload;
        }
    }

    let mut out: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let rem = out.len() % 4;
    if rem != 0 {
        out.extend(std::iter::repeat_n('=', 4 - rem));
    }
    out
}

/// Decodes after normalizing. Empty input yields empty bytes.
pub fn base64_to_bytes(s: &str) -> Result<Vec<u8>, CodecError> {
    let norm = normalize_base64(s);
    if norm.is_empty() {
        return Ok(Vec::new());
    }
    LENIENT
        .decode(norm.as_bytes())
        .map_err(|e| CodecError(e.to_string()))
}
