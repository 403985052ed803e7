//! Normalization of wallet signing output.
//!
//! Wallet integrations return signed transactions in many shapes. The shape
//! is probed once, at the boundary, into the closed [`SignedTxn`] union;
//! [`SignedTxn::normalize`] then maps each variant to the base64 string the
//! broadcast endpoint accepts.

use serde_json::Value;

use crate::codec::bytes_to_base64;
use crate::types::WalletSession;

/// Object keys under which wallets put the signed blob.
const BLOB_KEYS: [&str; 5] = ["blob", "signedTxn", "stx", "signed", "txnBlob"];

/// Signed transaction as returned by a wallet.
#[derive(Clone, Debug, PartialEq)]
pub enum SignedTxn {
    /// Raw signed bytes.
    Bytes(Vec<u8>),
    /// Raw signed bytes delivered as an untyped buffer.
    ArrayBuffer(Vec<u8>),
    /// Plain numeric array; values are checked to fit in a byte.
    ByteArray(Vec<i64>),
    /// Already base64 encoded; passed through unchanged.
    Base64(String),
    /// Opaque asynchronous blob handle that cannot be read in place.
    Blob {
        mime: Option<String>,
        size: Option<u64>,
    },
    /// Any other value.
    Other(Value),
}

/// Errors raised while normalizing signed output.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeError {
    #[error("wallet returned no signed transaction")]
    Missing,
    #[error("byte array element {index} is {value}, outside 0..=255")]
    ByteOutOfRange { index: usize, value: i64 },
    #[error("signed transaction is a blob; read it into bytes before normalizing")]
    UnsupportedSyncConversion,
    #[error("signed transaction was encoded through the JSON fallback and cannot be broadcast")]
    EncodingFallbackUsed,
}

/// Base64 form of a signed transaction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NormalizedTxn {
    b64: String,
    /// Set when the value went through the JSON fallback. Such output is
    /// almost certainly not a valid transaction.
    pub fallback_used: bool,
}

impl NormalizedTxn {
    pub fn as_str(&self) -> &str {
        &self.b64
    }

    pub fn into_base64(self) -> String {
        self.b64
    }

    /// Returns the string for broadcasting, refusing fallback output.
    pub fn for_broadcast(self) -> Result<String, NormalizeError> {
        if self.fallback_used {
            return Err(NormalizeError::EncodingFallbackUsed);
        }
        Ok(self.b64)
    }
}

impl SignedTxn {
    /// Classifies an arbitrary wallet response.
    ///
    /// Recognised shapes are a base64 string, an array of integers, and an
    /// object carrying a blob under one of the usual keys (`blob`,
    /// `signedTxn`, `stx`, `signed`, `txnBlob`) or a `bytes` array. A blob
    /// key holding anything but a string or array is treated as a
    /// [`SignedTxn::Blob`] handle.
    pub fn from_wallet_json(value: Value) -> Result<Self, NormalizeError> {
        match value {
            Value::Null => Err(NormalizeError::Missing),
            Value::String(s) if s.is_empty() => Err(NormalizeError::Missing),
            Value::String(s) => Ok(SignedTxn::Base64(s)),
            Value::Array(items) => Ok(integer_array(&items)
                .map(SignedTxn::ByteArray)
                .unwrap_or(SignedTxn::Other(Value::Array(items)))),
            Value::Object(map) => {
                let blob = BLOB_KEYS
                    .iter()
                    .find_map(|k| map.get(*k).filter(|v| is_truthy(v)));
                if let Some(inner) = blob {
                    return Ok(match inner {
                        Value::String(s) => SignedTxn::Base64(s.clone()),
                        Value::Array(items) => match integer_array(items) {
                            Some(bytes) => SignedTxn::ByteArray(bytes),
                            None => SignedTxn::Other(Value::Object(map.clone())),
                        },
                        other => SignedTxn::Blob {
                            mime: other.get("type").and_then(Value::as_str).map(str::to_string),
                            size: other.get("size").and_then(Value::as_u64),
                        },
                    });
                }
                if let Some(bytes) = map
                    .get("bytes")
                    .and_then(Value::as_array)
                    .and_then(|items| integer_array(items))
                {
                    return Ok(SignedTxn::ByteArray(bytes));
                }
                Ok(SignedTxn::Other(Value::Object(map)))
            }
            other => Ok(SignedTxn::Other(other)),
        }
    }

    /// Converts the signed transaction to base64.
    pub fn normalize(self) -> Result<NormalizedTxn, NormalizeError> {
        let b64 = match self {
            SignedTxn::Bytes(bytes) | SignedTxn::ArrayBuffer(bytes) => bytes_to_base64(&bytes),
            SignedTxn::ByteArray(values) => bytes_to_base64(&checked_bytes(&values)?),
            SignedTxn::Base64(s) => s,
            SignedTxn::Blob { .. } => return Err(NormalizeError::UnsupportedSyncConversion),
            SignedTxn::Other(value) => {
                let json = value.to_string();
                tracing::warn!(
                    json_len = json.len(),
                    "signed transaction has an unrecognised shape, using JSON fallback encoding"
                );
                return Ok(NormalizedTxn {
                    b64: bytes_to_base64(json.as_bytes()),
                    fallback_used: true,
                });
            }
        };
        Ok(NormalizedTxn {
            b64,
            fallback_used: false,
        })
    }
}

impl WalletSession {
    /// Normalizes output returned by this session's wallet.
    pub fn normalize_signed(&self, signed: SignedTxn) -> Result<NormalizedTxn, NormalizeError> {
        let normalized = signed.normalize()?;
        tracing::debug!(
            provider = %self.provider,
            address = %self.address,
            fallback_used = normalized.fallback_used,
            "normalized signed transaction"
        );
        Ok(normalized)
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn integer_array(items: &[Value]) -> Option<Vec<i64>> {
    items.iter().map(Value::as_i64).collect()
}

fn checked_bytes(values: &[i64]) -> Result<Vec<u8>, NormalizeError> {
    values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            u8::try_from(value).map_err(|_| NormalizeError::ByteOutOfRange { index, value })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn byte_shapes_normalize_identically() {
        let bytes = vec![0x82, 0xa3, 0x73, 0x69, 0x67, 0xc4, 0x40, 0x00, 0xff];
        let ints: Vec<i64> = bytes.iter().map(|&b| i64::from(b)).collect();

        let a = SignedTxn::Bytes(bytes.clone()).normalize().unwrap();
        let b = SignedTxn::ArrayBuffer(bytes.clone()).normalize().unwrap();
        let c = SignedTxn::ByteArray(ints).normalize().unwrap();

        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(!a.fallback_used);
        assert_eq!(a.as_str(), bytes_to_base64(&bytes));
    }

    #[test]
    fn base64_passes_through_unchanged() {
        let n = SignedTxn::Base64("gqNzaWfEQA-_".into()).normalize().unwrap();
        assert_eq!(n.into_base64(), "gqNzaWfEQA-_");
    }

    #[test]
    fn blob_is_rejected() {
        let blob = SignedTxn::Blob { mime: None, size: Some(12) };
        assert_eq!(blob.normalize(), Err(NormalizeError::UnsupportedSyncConversion));
    }

    #[test]
    fn out_of_range_byte_is_rejected() {
        let err = SignedTxn::ByteArray(vec![1, 256, 3]).normalize().unwrap_err();
        assert_eq!(err, NormalizeError::ByteOutOfRange { index: 1, value: 256 });

        let err = SignedTxn::ByteArray(vec![-1]).normalize().unwrap_err();
        assert_eq!(err, NormalizeError::ByteOutOfRange { index: 0, value: -1 });
    }

    #[test]
    fn unknown_shape_uses_flagged_json_fallback() {
        let value = json!({ "sig": 1 });
        let n = SignedTxn::Other(value.clone()).normalize().unwrap();
        assert!(n.fallback_used);
        assert_eq!(n.as_str(), bytes_to_base64(value.to_string().as_bytes()));
        assert_eq!(n.for_broadcast(), Err(NormalizeError::EncodingFallbackUsed));
    }

    #[test]
    fn wallet_json_shapes_are_classified() {
        assert_eq!(
            SignedTxn::from_wallet_json(json!("AAEC")).unwrap(),
            SignedTxn::Base64("AAEC".into())
        );
        assert_eq!(
            SignedTxn::from_wallet_json(json!([0, 1, 2])).unwrap(),
            SignedTxn::ByteArray(vec![0, 1, 2])
        );
        assert_eq!(
            SignedTxn::from_wallet_json(json!({ "blob": "AAEC" })).unwrap(),
            SignedTxn::Base64("AAEC".into())
        );
        assert_eq!(
            SignedTxn::from_wallet_json(json!({ "stx": "AAEC" })).unwrap(),
            SignedTxn::Base64("AAEC".into())
        );
        assert_eq!(
            SignedTxn::from_wallet_json(json!({ "blob": [9, 8] })).unwrap(),
            SignedTxn::ByteArray(vec![9, 8])
        );
        assert_eq!(
            SignedTxn::from_wallet_json(json!({ "bytes": [7] })).unwrap(),
            SignedTxn::ByteArray(vec![7])
        );
        assert_eq!(
            SignedTxn::from_wallet_json(json!({ "blob": { "size": 210, "type": "application/octet-stream" } }))
                .unwrap(),
            SignedTxn::Blob {
                mime: Some("application/octet-stream".into()),
                size: Some(210),
            }
        );
        assert!(matches!(
            SignedTxn::from_wallet_json(json!({ "txn": "AAEC" })).unwrap(),
            SignedTxn::Other(_)
        ));
        assert!(matches!(
            SignedTxn::from_wallet_json(json!(["a", "b"])).unwrap(),
            SignedTxn::Other(_)
        ));
        assert!(matches!(
            SignedTxn::from_wallet_json(json!(42)).unwrap(),
            SignedTxn::Other(_)
        ));
    }

    #[test]
    fn missing_output_is_an_error() {
        assert_eq!(SignedTxn::from_wallet_json(Value::Null), Err(NormalizeError::Missing));
        assert_eq!(SignedTxn::from_wallet_json(json!("")), Err(NormalizeError::Missing));
    }

    #[test]
    fn session_normalizes_like_the_free_function() {
        let session = WalletSession {
            address: Address::from_public_key([4u8; 32]),
            provider: "lute".into(),
        };
        let n = session.normalize_signed(SignedTxn::Bytes(vec![1, 2, 3])).unwrap();
        assert_eq!(n.for_broadcast().unwrap(), "AQID");
    }

    proptest! {
        #[test]
        fn representations_agree(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
            let ints = bytes.iter().map(|&b| i64::from(b)).collect();
            let a = SignedTxn::Bytes(bytes.clone()).normalize().unwrap();
            let b = SignedTxn::ArrayBuffer(bytes).normalize().unwrap();
            let c = SignedTxn::ByteArray(ints).normalize().unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(&a, &c);
        }
    }
}
