//! Core domain types used by the provenance engine
//!
//! This module defines strongly-typed content hashes, perceptual hashes,
//! registration keys and the wallet session value object that are shared
//! across hashing, transaction building and verification. Public APIs use
//! these newtypes instead of "naked" hex strings or byte buffers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// Registered media records and their lifecycle.
pub mod media;
/// Algorand addresses, suggested parameters and payment transactions.
pub mod txn;

pub use media::{MediaStatus, OnchainPresence, RegisteredMedia, StatusTransitionError};
pub use txn::{Address, AddressError, Note, PaymentTxn, SuggestedParams};

/// Length in bytes of the SHA-256 digests used in this module.
pub const HASH_LEN: usize = 32;

/// Error returned when a hex-encoded hash cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HashParseError {
    #[error("invalid hex encoding: {0}")]
    Hex(String),
    #[error("expected 32-byte hash, got {0} bytes")]
    Length(usize),
    #[error("perceptual hash must be a non-empty binary or hex string")]
    Perceptual,
}

/// SHA-256 digest of the exact file bytes.
///
/// Rendered and serialized as 64 lowercase hex characters. Parsing accepts
/// upper-case hex and an optional `0x` prefix.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ContentHash(pub [u8; HASH_LEN]);

impl ContentHash {
    /// Hashes `data` with SHA-256.
    pub fn compute(data: &[u8]) -> Self {
        ContentHash(Sha256::digest(data).into())
    }

    /// Returns the raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Returns the lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex digest, tolerating an `0x` prefix and surrounding whitespace.
    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| HashParseError::Hex(e.to_string()))?;
        let arr: [u8; HASH_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| HashParseError::Length(bytes.len()))?;
        Ok(ContentHash(arr))
    }

    /// Derives the registry content key `K = SHA-256(H)`.
    pub fn content_key(&self) -> ContentKey {
        ContentKey(Sha256::digest(self.0).into())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ContentHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Content key stored by the registry (`K = SHA-256(H)`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ContentKey(pub [u8; HASH_LEN]);

impl ContentKey {
    /// Derives the unique registration key `SHA-256(K || nonce)`.
    ///
    /// The nonce is normally the id of the payment transaction that anchors
    /// the registration, so the same key can be recomputed from the chain.
    pub fn registration_key(&self, nonce: &str) -> RegistrationKey {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.update(nonce.as_bytes());
        RegistrationKey(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Per-registration key (`unique_reg_key`), hex encoded on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RegistrationKey(pub [u8; HASH_LEN]);

impl RegistrationKey {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Length of a 64-bit perceptual hash in hex.
const HEX_PHASH_LEN: usize = 16;

/// Perceptual hash as an ordered sequence of bits.
///
/// The aHash produced by [`crate::hashing::compute_perceptual_hash`] is
/// always 64 bits long, but registry records may carry hashes of other
/// lengths (for example 16 hex characters from a server-side hasher), so
/// the type itself does not fix the length.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PerceptualHash {
    bits: Vec<bool>,
}

impl PerceptualHash {
    /// Builds a hash from bits in row-major order.
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Builds a 64-bit hash from a `u64`, most significant bit first.
    pub fn from_u64(value: u64) -> Self {
        let bits = (0..64).rev().map(|i| (value >> i) & 1 == 1).collect();
        Self { bits }
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Parses either a `'0'`/`'1'` string or a hex string.
    ///
    /// Length decides first: 16 characters (the hex form of a 64-bit hash)
    /// or an `0x` prefix means hex, even when every digit is `0` or `1`.
    /// Any other string made only of `0` and `1` is read as binary.
    pub fn parse(s: &str) -> Result<Self, HashParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(HashParseError::Perceptual);
        }

        let hex_form = s.starts_with("0x") || s.len() == HEX_PHASH_LEN;
        if !hex_form && s.bytes().all(|b| b == b'0' || b == b'1') {
            return Ok(Self {
                bits: s.bytes().map(|b| b == b'1').collect(),
            });
        }

        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bits = Vec::with_capacity(s.len() * 4);
        for c in s.chars() {
            let nibble = c.to_digit(16).ok_or(HashParseError::Perceptual)?;
            bits.extend((0..4).rev().map(|i| (nibble >> i) & 1 == 1));
        }
        Ok(Self { bits })
    }
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: String = self.bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
        f.write_str(&s)
    }
}

impl FromStr for PerceptualHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PerceptualHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PerceptualHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PerceptualHash::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Identity fingerprint of one uploaded file.
///
/// Immutable once computed. `perceptual_hash` is `None` for content that
/// cannot be decoded as an image; callers must treat that as "perceptual
/// comparison unavailable", never as a zero-distance match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MediaFingerprint {
    pub sha256_hash: ContentHash,
    pub perceptual_hash: Option<PerceptualHash>,
}

impl MediaFingerprint {
    /// Registry content key derived from the SHA-256 hash.
    pub fn content_key(&self) -> ContentKey {
        self.sha256_hash.content_key()
    }
}

/// Connected wallet, passed explicitly to the builder and normalizer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WalletSession {
    /// Account the wallet signs for.
    pub address: Address,
    /// Wallet integration name (e.g. `"pera"`, `"lute"`), used in logs.
    pub provider: String,
}

impl WalletSession {
    /// Creates a session after validating `address`.
    pub fn new(address: &str, provider: impl Into<String>) -> Result<Self, AddressError> {
        Ok(Self {
            address: address.parse()?,
            provider: provider.into(),
        })
    }
}
