//! Payment transaction construction.

use std::fmt;

use crate::algod::ParamsSource;
use crate::registry::NetworkError;
use crate::types::{Address, AddressError, Note, PaymentTxn, WalletSession};

/// Which side of the payment an address belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AddressRole {
    Sender,
    Receiver,
}

impl fmt::Display for AddressRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressRole::Sender => f.write_str("sender"),
            AddressRole::Receiver => f.write_str("receiver"),
        }
    }
}

/// Errors raised while building a payment.
#[derive(Debug, thiserror::Error)]
pub enum TxnError {
    #[error("invalid {role} address {address:?}: {reason}")]
    InvalidAddress {
        role: AddressRole,
        address: String,
        #[source]
        reason: AddressError,
    },
    #[error("note is {len} bytes, at most {max} allowed")]
    NoteTooLarge { len: usize, max: usize },
    #[error(transparent)]
    Network(#[from] NetworkError),
}

fn parse_address(role: AddressRole, s: &str) -> Result<Address, TxnError> {
    s.parse().map_err(|reason| TxnError::InvalidAddress {
        role,
        address: s.to_string(),
        reason,
    })
}

/// Builds unsigned payments from fresh network parameters.
///
/// The builder holds no state besides its parameter source; every call
/// fetches parameters again, so a built transaction is only valid for the
/// round window current at build time.
#[derive(Clone, Debug)]
pub struct TransactionBuilder<P> {
    params: P,
}

impl<P: ParamsSource> TransactionBuilder<P> {
    pub fn new(params: P) -> Self {
        Self { params }
    }

    /// Builds a payment of `amount` micro-Algos from `from` to `to`.
    ///
    /// Both addresses and the note are validated before any network call.
    pub async fn build_payment(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        note: Option<Note>,
    ) -> Result<PaymentTxn, TxnError> {
        let sender = parse_address(AddressRole::Sender, from)?;
        let receiver = parse_address(AddressRole::Receiver, to)?;
        self.build(sender, receiver, amount, note).await
    }

    /// Builds a payment sent from the connected wallet's account.
    pub async fn build_for_session(
        &self,
        session: &WalletSession,
        to: &str,
        amount: u64,
        note: Option<Note>,
    ) -> Result<PaymentTxn, TxnError> {
        let receiver = parse_address(AddressRole::Receiver, to)?;
        self.build(session.address, receiver, amount, note).await
    }

    async fn build(
        &self,
        sender: Address,
        receiver: Address,
        amount: u64,
        note: Option<Note>,
    ) -> Result<PaymentTxn, TxnError> {
        let note = note.map(Note::into_bytes);
        if let Some(len) = note.as_ref().map(Vec::len) {
            if len > PaymentTxn::MAX_NOTE_LEN {
                return Err(TxnError::NoteTooLarge {
                    len,
                    max: PaymentTxn::MAX_NOTE_LEN,
                });
            }
        }

        let params = self.params.suggested_params().await?;
        let txn = PaymentTxn::new(sender, receiver, amount, note, &params);

        tracing::debug!(
            txid = %txn.id(),
            fee = txn.fee,
            first_valid = txn.first_valid,
            last_valid = txn.last_valid,
            "built payment transaction"
        );
        Ok(txn)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::types::SuggestedParams;

    #[derive(Default)]
    struct CountingParams {
        calls: AtomicUsize,
        fail: bool,
    }

    impl ParamsSource for CountingParams {
        async fn suggested_params(&self) -> Result<SuggestedParams, NetworkError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
            if self.fail {
                return Err(NetworkError::Status {
                    endpoint: "/media/algod_params".to_string(),
                    status: 503,
                    body: "algod down".to_string(),
                });
            }
            Ok(SuggestedParams {
                fee: 0,
                min_fee: SuggestedParams::DEFAULT_MIN_FEE,
                first_valid: 100 + n,
                last_valid: 1_100 + n,
                genesis_id: "testnet-v1.0".to_string(),
                genesis_hash: [3u8; 32],
                flat_fee: false,
            })
        }
    }

    fn addr(byte: u8) -> String {
        Address::from_public_key([byte; 32]).to_string()
    }

    #[tokio::test]
    async fn invalid_address_fails_before_any_network_call() {
        let source = Arc::new(CountingParams::default());
        let builder = TransactionBuilder::new(source.clone());

        let err = builder
            .build_payment("not-an-address", &addr(2), 1, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TxnError::InvalidAddress { role: AddressRole::Sender, .. }
        ));

        let err = builder
            .build_payment(&addr(1), "ALSO-BAD", 1, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TxnError::InvalidAddress { role: AddressRole::Receiver, .. }
        ));

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn params_are_fetched_fresh_for_every_build() {
        let source = Arc::new(CountingParams::default());
        let builder = TransactionBuilder::new(source.clone());

        let a = builder.build_payment(&addr(1), &addr(2), 1, None).await.unwrap();
        let b = builder.build_payment(&addr(1), &addr(2), 1, None).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(a.first_valid, 100);
        assert_eq!(b.first_valid, 101);
    }

    #[tokio::test]
    async fn amount_and_note_are_carried_verbatim() {
        let builder = TransactionBuilder::new(CountingParams::default());

        let txn = builder
            .build_payment(&addr(1), &addr(2), 1_234_567, Some(Note::from("reg:abc")))
            .await
            .unwrap();
        assert_eq!(txn.amount, 1_234_567);
        assert_eq!(txn.note.as_deref(), Some(&b"reg:abc"[..]));
        assert_eq!(txn.fee, SuggestedParams::DEFAULT_MIN_FEE);

        let raw = vec![0u8, 159, 146, 150];
        let txn = builder
            .build_payment(&addr(1), &addr(2), 0, Some(Note::Bytes(raw.clone())))
            .await
            .unwrap();
        assert_eq!(txn.note, Some(raw));

        let txn = builder.build_payment(&addr(1), &addr(2), 0, None).await.unwrap();
        assert!(txn.note.is_none());
    }

    #[tokio::test]
    async fn oversized_note_is_rejected_without_fetching_params() {
        let source = Arc::new(CountingParams::default());
        let builder = TransactionBuilder::new(source.clone());

        let err = builder
            .build_payment(&addr(1), &addr(2), 1, Some(Note::Bytes(vec![0; 1025])))
            .await
            .unwrap_err();
        assert!(matches!(err, TxnError::NoteTooLarge { len: 1025, max: 1024 }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn network_failure_is_surfaced() {
        let builder = TransactionBuilder::new(CountingParams {
            fail: true,
            ..Default::default()
        });
        let err = builder
            .build_payment(&addr(1), &addr(2), 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TxnError::Network(NetworkError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn session_address_is_used_as_sender() {
        let builder = TransactionBuilder::new(CountingParams::default());
        let session = WalletSession::new(&addr(9), "pera").unwrap();

        let txn = builder
            .build_for_session(&session, &addr(2), 5, None)
            .await
            .unwrap();
        assert_eq!(txn.sender, session.address);
    }
}
