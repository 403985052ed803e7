//! Algorand transaction types.
//!
//! This module defines the payment transaction used to anchor a media
//! registration on-chain, together with:
//!
//! - [`Address`]: a checksummed Algorand account address,
//! - [`SuggestedParams`]: the network-supplied, time-bounded parameters,
//! - [`Note`]: the optional note payload.
//!
//! [`PaymentTxn`] is unsigned; signing happens in an external wallet.

use std::fmt;
use std::str::FromStr;

use data_encoding::BASE32_NOPAD;
use serde::Serialize;
use sha2::{Digest, Sha512_256};


/// Length of an Algorand public key.
pub const PUBLIC_KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;
/// Length of the textual address form.
pub const ADDRESS_LEN: usize = 58;

/// Error returned when an address string is not a valid Algorand address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("expected 58 characters, got {0}")]
    Length(usize),
    #[error("invalid base32: {0}")]
    Encoding(String),
    #[error("checksum mismatch")]
    Checksum,
}

/// Algorand account address (32-byte public key).
///
/// The textual form is base32 (no padding) of the public key followed by
/// the last four bytes of `SHA-512/256(public key)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Address(pub [u8; PUBLIC_KEY_LEN]);

impl Address {
    pub fn from_public_key(pk: [u8; PUBLIC_KEY_LEN]) -> Self {
        Address(pk)
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    fn checksum(pk: &[u8; PUBLIC_KEY_LEN]) -> [u8; CHECKSUM_LEN] {
        let digest = Sha512_256::digest(pk);
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = Vec::with_capacity(PUBLIC_KEY_LEN + CHECKSUM_LEN);
        raw.extend_from_slice(&self.0);
        raw.extend_from_slice(&Self::checksum(&self.0));
        f.write_str(&BASE32_NOPAD.encode(&raw))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_LEN {
            return Err(AddressError::Length(s.len()));
        }

        let raw = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|e| AddressError::Encoding(e.to_string()))?;
        if raw.len() != PUBLIC_KEY_LEN + CHECKSUM_LEN {
            return Err(AddressError::Encoding(format!(
                "decoded to {} bytes",
                raw.len()
            )));
        }

        let mut pk = [0u8; PUBLIC_KEY_LEN];
        pk.copy_from_slice(&raw[..PUBLIC_KEY_LEN]);
        if raw[PUBLIC_KEY_LEN..] != Self::checksum(&pk) {
            return Err(AddressError::Checksum);
        }
        Ok(Address(pk))
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Network parameters required to build a valid transaction.
///
/// These are only valid for the round window `[first_valid, last_valid]`
/// and must be fetched again for every build.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SuggestedParams {
    /// Fee per byte, or the absolute fee when `flat_fee` is set.
    pub fee: u64,
    /// Lower bound applied to per-byte fees.
    pub min_fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    #[serde(serialize_with = "serialize_genesis_hash")]
    pub genesis_hash: [u8; 32],
    pub flat_fee: bool,
}

fn serialize_genesis_hash<S: serde::Serializer>(
    hash: &[u8; 32],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&crate::codec::bytes_to_base64(hash))
}

impl SuggestedParams {
    /// Protocol minimum fee in micro-Algos.
    pub const DEFAULT_MIN_FEE: u64 = 1_000;
}

/// Optional transaction note.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Note {
    /// Encoded as UTF-8.
    Text(String),
    /// Attached verbatim.
    Bytes(Vec<u8>),
}

impl Note {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Note::Text(s) => s.into_bytes(),
            Note::Bytes(b) => b,
        }
    }
}

impl From<&str> for Note {
    fn from(s: &str) -> Self {
        Note::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Note {
    fn from(b: Vec<u8>) -> Self {
        Note::Bytes(b)
    }
}

/// Unsigned Algorand payment transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaymentTxn {
    pub sender: Address,
    pub receiver: Address,
    /// Amount in micro-Algos, exactly as supplied by the caller.
    pub amount: u64,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
    pub note: Option<Vec<u8>>,
}

impl PaymentTxn {
    /// Maximum note size accepted by the network.
    pub const MAX_NOTE_LEN: usize = 1024;

    /// Size of the signature envelope added by wallets, used for fee estimation.
    const SIGNATURE_OVERHEAD: u64 = 75;

    /// Assembles a payment from validated parts and fresh parameters.
    ///
    /// For non-flat fees the per-byte fee is multiplied by the estimated
    /// signed size and clamped to `min_fee`.
    pub fn new(
        sender: Address,
        receiver: Address,
        amount: u64,
        note: Option<Vec<u8>>,
        params: &SuggestedParams,
    ) -> Self {
        let mut txn = PaymentTxn {
            sender,
            receiver,
            amount,
            fee: params.min_fee,
            first_valid: params.first_valid,
            last_valid: params.last_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            note,
        };

        txn.fee = if params.flat_fee {
            params.fee
        } else {
            let size = txn.encode().len() as u64 + Self::SIGNATURE_OVERHEAD;
            params.fee.saturating_mul(size).max(params.min_fee)
        };
        txn
    }

    /// Canonical msgpack encoding (sorted keys, zero values omitted).
    ///
    /// Encoded with `rmp-serde` from the private wire struct. Transaction ids and
    /// fee estimates go through this method so the bytes never drift.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails. This is a programming error: the wire
    /// struct only holds integers, strings and byte slices, and the target
    /// is an in-memory buffer.
    pub fn encode(&self) -> Vec<u8> {
        let wire = PaymentWire {
            amt: self.amount,
            fee: self.fee,
            fv: self.first_valid,
            genesis_id: &self.genesis_id,
            gh: &self.genesis_hash,
            lv: self.last_valid,
            note: self.note.as_deref().unwrap_or_default(),
            rcv: self.receiver.public_key(),
            snd: self.sender.public_key(),
            kind: "pay",
        };
        rmp_serde::to_vec_named(&wire).expect("payment wire form should always encode to msgpack")
    }

    /// Bytes a wallet signs: the `"TX"` domain prefix followed by [`Self::encode`].
    pub fn bytes_to_sign(&self) -> Vec<u8> {
        let body = self.encode();
        let mut out = Vec::with_capacity(body.len() + 2);
        out.extend_from_slice(b"TX");
        out.extend_from_slice(&body);
        out
    }

    /// Transaction id: base32 (no padding) of `SHA-512/256(bytes_to_sign)`.
    pub fn id(&self) -> String {
        BASE32_NOPAD.encode(&Sha512_256::digest(self.bytes_to_sign()))
    }
}

/// Wire form of a payment, with fields in canonical (sorted) key order.
///
/// Zero integers, empty strings, empty notes and all-zero 32-byte keys are
/// left out, matching the encoding the network hashes for transaction ids.
#[derive(Serialize)]
struct PaymentWire<'a> {
    #[serde(skip_serializing_if = "is_zero")]
    amt: u64,
    #[serde(skip_serializing_if = "is_zero")]
    fee: u64,
    #[serde(skip_serializing_if = "is_zero")]
    fv: u64,
    #[serde(rename = "gen", skip_serializing_if = "str_is_empty")]
    genesis_id: &'a str,
    #[serde(with = "serde_bytes", skip_serializing_if = "is_zero_key")]
    gh: &'a [u8],
    #[serde(skip_serializing_if = "is_zero")]
    lv: u64,
    #[serde(with = "serde_bytes", skip_serializing_if = "bytes_is_empty")]
    note: &'a [u8],
    #[serde(with = "serde_bytes", skip_serializing_if = "is_zero_key")]
    rcv: &'a [u8],
    #[serde(with = "serde_bytes", skip_serializing_if = "is_zero_key")]
    snd: &'a [u8],
    #[serde(rename = "type")]
    kind: &'a str,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

fn str_is_empty(s: &&str) -> bool {
    s.is_empty()
}

fn bytes_is_empty(b: &&[u8]) -> bool {
    b.is_empty()
}

fn is_zero_key(key: &&[u8]) -> bool {
    key.iter().all(|&b| b == 0)
}
