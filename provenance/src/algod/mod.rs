//! Algorand transaction plumbing.
//!
//! This module builds the unsigned payment that anchors a registration and
//! normalizes whatever the wallet hands back after signing:
//!
//! - [`ParamsSource`] supplies fresh suggested parameters for every build,
//! - [`TransactionBuilder`] validates addresses and assembles a
//!   [`crate::types::PaymentTxn`],
//! - [`SignedTxn`] / [`NormalizedTxn`] turn wallet output into the base64
//!   string the broadcast endpoint expects.
//!
//! Signing itself always happens in an external wallet.

pub mod builder;
pub mod signed;

use std::future::Future;

pub use builder::{AddressRole, TransactionBuilder, TxnError};
pub use signed::{NormalizeError, NormalizedTxn, SignedTxn};

use crate::registry::NetworkError;
use crate::types::SuggestedParams;

/// Source of network-suggested transaction parameters.
///
/// Implementations must not cache: every call reflects the current round
/// window.
pub trait ParamsSource: Send + Sync {
    fn suggested_params(&self) -> impl Future<Output = Result<SuggestedParams, NetworkError>> + Send;
}

impl<T: ParamsSource> ParamsSource for std::sync::Arc<T> {
    fn suggested_params(&self) -> impl Future<Output = Result<SuggestedParams, NetworkError>> + Send {
        (**self).suggested_params()
    }
}
