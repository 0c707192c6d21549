//! Collecting co-signer signatures on a proposal.

use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::metrics::CoordinatorMetrics;
use crate::proposal::load_transaction;
use crate::retry::retry_on_conflict;
use crate::wallet_state::load_wallet;
use cosign_contract::MessageSigner;
use cosign_store::{StoreError, TransactionStore, WalletStore};
use cosign_types::{
    Address, Clock, Signature, SignerEntry, Transaction, TransactionId, TransactionStatus, Wallet,
};
use cosign_utils::truncate_address;
use std::sync::Arc;

/// Whether `tx` may be submitted for `wallet`: status `readyToExecute` and at
/// least `wallet.threshold` signatures, re-derived on every call.
pub fn is_ready_to_execute(tx: &Transaction, wallet: &Wallet) -> bool {
    tx.status == TransactionStatus::ReadyToExecute
        && tx.signer_count() >= wallet.threshold as usize
}

pub struct SignatureCollector<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: CoordinatorConfig,
    metrics: Arc<CoordinatorMetrics>,
}

impl<S> SignatureCollector<S>
where
    S: WalletStore + TransactionStore,
{
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
        metrics: Arc<CoordinatorMetrics>,
    ) -> Self {
        Self {
            store,
            clock,
            config,
            metrics,
        }
    }

    /// Append `signature` from `signer` and recompute the status.
    ///
    /// The check-and-append re-runs against fresh state whenever another
    /// writer bumped the transaction's version in between.
    pub fn sign(
        &self,
        id: TransactionId,
        signer: Address,
        signature: Signature,
    ) -> Result<Transaction, CoordinatorError> {
        let tx = retry_on_conflict(self.config.max_update_retries, "sign", || {
            let tx = load_transaction(&*self.store, id)?;
            let wallet = load_wallet(&*self.store, &tx.wallet_address)?;
            check_can_sign(&tx, &wallet, signer)?;

            let mut next = tx;
            next.signers.push(SignerEntry {
                address: signer,
                signature: signature.clone(),
            });
            next.status = TransactionStatus::after_signature(next.signer_count(), wallet.threshold);
            next.updated_at = self.clock.now();
            self.store.update_transaction(&next).map_err(|e| {
                if matches!(e, StoreError::Conflict(_)) {
                    self.metrics.update_conflicts.inc();
                }
                CoordinatorError::from(e)
            })
        })?;

        self.metrics.signatures_collected.inc();
        tracing::info!(
            id = %id,
            signer = %truncate_address(&signer),
            signatures = tx.signer_count(),
            status = %tx.status,
            "signature added"
        );
        Ok(tx)
    }

    /// Ask `signer` to sign the proposal's hash, then append the result.
    ///
    /// Authorization is checked before the signer is prompted.
    pub async fn sign_with<M: MessageSigner>(
        &self,
        id: TransactionId,
        signer: &M,
    ) -> Result<Transaction, CoordinatorError> {
        let account = signer.address();
        let tx = load_transaction(&*self.store, id)?;
        let wallet = load_wallet(&*self.store, &tx.wallet_address)?;
        check_can_sign(&tx, &wallet, account)?;

        let signature = signer
            .sign_message(&tx.signature_required_hash)
            .await
            .map_err(|e| {
                tracing::warn!(id = %id, signer = %truncate_address(&account), error = %e, "signing failed");
                CoordinatorError::from(e)
            })?;
        self.sign(id, account, signature)
    }
}

fn check_can_sign(tx: &Transaction, wallet: &Wallet, signer: Address) -> Result<(), CoordinatorError> {
    if !tx.status.is_signable() {
        return Err(CoordinatorError::NotSignable {
            id: tx.id,
            status: tx.status,
        });
    }
    if !wallet.is_signer(&signer) {
        return Err(CoordinatorError::NotAuthorizedSigner {
            signer,
            wallet: wallet.address,
        });
    }
    if tx.has_signed(&signer) {
        return Err(CoordinatorError::AlreadySigned { signer, id: tx.id });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosign_nullables::{NullClock, NullSigner, NullStore};
    use cosign_store::NewTransaction;
    use cosign_types::{Action, Bytes, ContractCall, Timestamp, TxHash, U256};

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn setup(threshold: u32) -> (Arc<NullStore>, SignatureCollector<NullStore>, TransactionId) {
        let store = Arc::new(NullStore::new());
        let wallet = Wallet::new(
            addr(0xAA),
            1,
            vec![addr(1), addr(2), addr(3)],
            threshold,
            None,
            Timestamp::new(0),
        )
        .unwrap();
        store.insert_wallet(&wallet).unwrap();
        let tx = store
            .insert_transaction(NewTransaction {
                wallet_address: wallet.address,
                nonce: 0,
                action: Action::TransferFunds {
                    to: addr(9),
                    amount: U256::from(1u64),
                },
                call: ContractCall {
                    to: addr(9),
                    value: U256::from(1u64),
                    data: Bytes::new(),
                },
                signature_required_hash: TxHash::repeat_byte(0x42),
                proposed_by: addr(1),
                created_at: Timestamp::new(1),
            })
            .unwrap();
        let collector = SignatureCollector::new(
            Arc::clone(&store),
            Arc::new(NullClock::new(10)),
            CoordinatorConfig::default(),
            Arc::new(CoordinatorMetrics::new()),
        );
        (store, collector, tx.id)
    }

    fn sig(b: u8) -> Signature {
        Signature::from(vec![b; 65])
    }

    #[test]
    fn statuses_follow_threshold() {
        let (_store, collector, id) = setup(2);
        let tx = collector.sign(id, addr(1), sig(1)).unwrap();
        assert_eq!(tx.status, TransactionStatus::Pending);
        let tx = collector.sign(id, addr(2), sig(2)).unwrap();
        assert_eq!(tx.status, TransactionStatus::ReadyToExecute);
        assert!(matches!(
            collector.sign(id, addr(3), sig(3)),
            Err(CoordinatorError::NotSignable { .. })
        ));
    }

    #[test]
    fn rejects_outsiders_and_repeats_without_writing() {
        let (store, collector, id) = setup(3);
        assert!(matches!(
            collector.sign(id, addr(9), sig(9)),
            Err(CoordinatorError::NotAuthorizedSigner { .. })
        ));
        assert_eq!(store.get_transaction(id).unwrap().version, 0);

        collector.sign(id, addr(1), sig(1)).unwrap();
        assert!(matches!(
            collector.sign(id, addr(1), sig(1)),
            Err(CoordinatorError::AlreadySigned { .. })
        ));
        assert_eq!(store.get_transaction(id).unwrap().signer_count(), 1);
    }

    #[test]
    fn conflicts_are_retried_then_reported() {
        let (store, collector, id) = setup(2);
        store.inject_conflicts(2);
        assert_eq!(collector.sign(id, addr(1), sig(1)).unwrap().signer_count(), 1);

        store.inject_conflicts(100);
        assert!(matches!(
            collector.sign(id, addr(2), sig(2)),
            Err(CoordinatorError::Conflict(_))
        ));
    }

    #[test]
    fn readiness_is_rederived() {
        let (store, collector, id) = setup(1);
        let tx = collector.sign(id, addr(1), sig(1)).unwrap();
        let mut wallet = store.get_wallet(&addr(0xAA)).unwrap();
        assert!(is_ready_to_execute(&tx, &wallet));
        // Threshold raised since the signature was collected.
        wallet.threshold = 2;
        assert!(!is_ready_to_execute(&tx, &wallet));
    }

    #[tokio::test]
    async fn sign_with_uses_signer_over_hash() {
        let (_store, collector, id) = setup(2);
        let signer = NullSigner::new(addr(2));
        let tx = collector.sign_with(id, &signer).await.unwrap();
        assert_eq!(tx.signers[0].address, addr(2));
        assert_eq!(
            tx.signers[0].signature,
            NullSigner::signature_for(addr(2), &TxHash::repeat_byte(0x42))
        );

        let outsider = NullSigner::new(addr(9));
        assert!(collector.sign_with(id, &outsider).await.is_err());
        assert_eq!(outsider.signed_count(), 0);
    }
}
