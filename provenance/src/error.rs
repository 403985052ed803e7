//! Crate-level error type.

use crate::algod::{NormalizeError, TxnError};
use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::hashing::HashingError;
use crate::registry::NetworkError;
use crate::types::{AddressError, HashParseError};

/// Any error produced by this crate.
///
/// Each operation returns its own narrower error; this type exists for
/// callers that compose several operations with `?`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Hashing(#[from] HashingError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Txn(#[from] TxnError),
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    HashParse(#[from] HashParseError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("metrics registry: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
