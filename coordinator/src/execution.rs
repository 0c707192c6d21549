//! Submitting fully signed proposals and reconciling their outcome.
//!
//! Flow of [`ExecutionCoordinator::execute`]:
//! 1. Stale check (transaction nonce vs wallet nonce), then readiness.
//! 2. Take the wallet's in-process lock and repeat both checks.
//! 3. If an earlier submission is recorded, wait for its receipt and
//!    reconcile it; never submit a second time while one is outstanding.
//! 4. Compare against the contract's on-chain nonce.
//! 5. Submit with signatures ordered by signer address, record the
//!    submission, poll for the receipt.
//! 6. Success: mark executed and advance the wallet in one store write.
//!    Revert: mark failed, wallet untouched.

use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::locks::WalletLocks;
use crate::metrics::CoordinatorMetrics;
use crate::proposal::load_transaction;
use crate::retry::retry_on_conflict;
use crate::signature::is_ready_to_execute;
use crate::wallet_state::load_wallet;
use cosign_contract::{ContractError, MultisigContract};
use cosign_store::ExecutionStore;
use cosign_types::{
    Address, Clock, ExecutionRecord, Receipt, Transaction, TransactionId, TransactionStatus,
    TxHash, Wallet,
};
use cosign_utils::{format_wait, truncate_address};
use std::sync::Arc;
use std::time::Instant;

pub struct ExecutionCoordinator<S, C> {
    store: Arc<S>,
    contract: Arc<C>,
    clock: Arc<dyn Clock>,
    config: CoordinatorConfig,
    metrics: Arc<CoordinatorMetrics>,
    locks: Arc<WalletLocks>,
}

impl<S, C> ExecutionCoordinator<S, C>
where
    S: ExecutionStore,
    C: MultisigContract,
{
    pub fn new(
        store: Arc<S>,
        contract: Arc<C>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
        metrics: Arc<CoordinatorMetrics>,
        locks: Arc<WalletLocks>,
    ) -> Self {
        Self {
            store,
            contract,
            clock,
            config,
            metrics,
            locks,
        }
    }

    /// Execute a `readyToExecute` proposal on-chain on behalf of `submitter`.
    ///
    /// Returns the success receipt. A revert yields `ExecutionFailed`; a
    /// submission error or missing receipt leaves the proposal
    /// `readyToExecute` and can be retried.
    pub async fn execute(
        &self,
        id: TransactionId,
        submitter: Address,
    ) -> Result<Receipt, CoordinatorError> {
        let (_, wallet) = self.load_executable(id)?;

        let guard = self.locks.acquire(wallet.address).await;
        let result = self.execute_locked(id, submitter).await;
        drop(guard);
        self.locks.cleanup().await;
        result
    }

    fn load_executable(&self, id: TransactionId) -> Result<(Transaction, Wallet), CoordinatorError> {
        let tx = load_transaction(&*self.store, id)?;
        let wallet = load_wallet(&*self.store, &tx.wallet_address)?;
        if tx.nonce != wallet.nonce {
            return Err(CoordinatorError::Stale {
                transaction_nonce: tx.nonce,
                wallet_nonce: wallet.nonce,
            });
        }
        if !is_ready_to_execute(&tx, &wallet) {
            return Err(CoordinatorError::NotReady {
                id,
                status: tx.status,
                signatures: tx.signer_count(),
                threshold: wallet.threshold,
            });
        }
        Ok((tx, wallet))
    }

    async fn execute_locked(
        &self,
        id: TransactionId,
        submitter: Address,
    ) -> Result<Receipt, CoordinatorError> {
        let (tx, wallet) = self.load_executable(id)?;

        // One submission per transaction: a recorded one is settled only by its receipt.
        if let Some(previous) = tx.pending_submission {
            tracing::info!(id = %id, transaction_ref = %previous, "awaiting earlier submission");
            let receipt = self.await_receipt(previous).await?;
            return self.finalize(id, receipt, submitter);
        }

        let onchain_nonce = self
            .contract
            .nonce(wallet.address)
            .await
            .map_err(|e| self.upstream(e))?;
        if onchain_nonce != tx.nonce {
            tracing::warn!(
                id = %id,
                wallet = %truncate_address(&wallet.address),
                transaction_nonce = tx.nonce,
                onchain_nonce,
                "on-chain nonce does not match"
            );
            return Err(CoordinatorError::Stale {
                transaction_nonce: tx.nonce,
                wallet_nonce: onchain_nonce,
            });
        }

        let signatures = tx.ordered_signatures();
        let transaction_ref = self
            .contract
            .submit_execution(wallet.address, &tx.call, &signatures, submitter)
            .await
            .map_err(|e| {
                self.metrics.upstream_errors.inc();
                tracing::warn!(id = %id, error = %e, "submission failed");
                CoordinatorError::from(e)
            })?;
        self.metrics.executions_submitted.inc();
        tracing::info!(
            id = %id,
            wallet = %truncate_address(&wallet.address),
            nonce = tx.nonce,
            signatures = signatures.len(),
            submitter = %truncate_address(&submitter),
            %transaction_ref,
            "execution submitted"
        );

        if let Err(e) = self.record_submission(id, transaction_ref) {
            tracing::warn!(id = %id, %transaction_ref, error = %e, "could not record submission");
        }

        let receipt = self.await_receipt(transaction_ref).await?;
        self.finalize(id, receipt, submitter)
    }

    fn record_submission(
        &self,
        id: TransactionId,
        transaction_ref: TxHash,
    ) -> Result<(), CoordinatorError> {
        retry_on_conflict(self.config.max_update_retries, "record submission", || {
            let mut tx = load_transaction(&*self.store, id)?;
            tx.pending_submission = Some(transaction_ref);
            tx.updated_at = self.clock.now();
            self.store.update_transaction(&tx)?;
            Ok(())
        })
    }

    /// Poll for the receipt of `transaction_ref` until it appears or the
    /// configured timeout elapses.
    async fn await_receipt(&self, transaction_ref: TxHash) -> Result<Receipt, CoordinatorError> {
        let interval = self.config.receipt_poll_interval();
        let timeout = self.config.receipt_timeout();
        let started = Instant::now();

        let poll = async {
            loop {
                match self.contract.receipt(transaction_ref).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => {}
                    Err(e) => {
                        tracing::debug!(%transaction_ref, error = %e, "receipt lookup failed, will retry");
                    }
                }
                tokio::time::sleep(interval).await;
            }
        };

        self.metrics.executions_in_flight.inc();
        let outcome = tokio::time::timeout(timeout, poll).await;
        self.metrics.executions_in_flight.dec();

        match outcome {
            Ok(receipt) => {
                let waited = started.elapsed();
                self.metrics
                    .receipt_latency_ms
                    .observe(waited.as_millis() as f64);
                tracing::debug!(%transaction_ref, waited = %format_wait(waited), "receipt observed");
                Ok(receipt)
            }
            Err(_) => {
                self.metrics.upstream_errors.inc();
                tracing::warn!(%transaction_ref, "no receipt observed");
                Err(CoordinatorError::UpstreamUnavailable(format!(
                    "no receipt for {transaction_ref} after {}",
                    format_wait(timeout)
                )))
            }
        }
    }

    fn finalize(
        &self,
        id: TransactionId,
        receipt: Receipt,
        submitter: Address,
    ) -> Result<Receipt, CoordinatorError> {
        let record = ExecutionRecord {
            transaction_ref: receipt.transaction_ref,
            block_number: receipt.block_number,
            block_hash: receipt.block_hash,
            submitted_by: submitter,
            observed_at: self.clock.now(),
        };
        if receipt.success {
            self.commit_success(id, record)?;
            Ok(receipt)
        } else {
            self.record_failure(id, record)?;
            Err(CoordinatorError::ExecutionFailed {
                transaction_ref: receipt.transaction_ref,
            })
        }
    }

    /// Mark executed and advance the wallet in a single store write.
    fn commit_success(
        &self,
        id: TransactionId,
        record: ExecutionRecord,
    ) -> Result<(), CoordinatorError> {
        let committed = retry_on_conflict(self.config.max_update_retries, "commit execution", || {
            let tx = load_transaction(&*self.store, id)?;
            if tx.status == TransactionStatus::Executed {
                return Ok(None);
            }
            let wallet = load_wallet(&*self.store, &tx.wallet_address)?;
            if wallet.nonce != tx.nonce {
                return Err(CoordinatorError::Stale {
                    transaction_nonce: tx.nonce,
                    wallet_nonce: wallet.nonce,
                });
            }
            let now = self.clock.now();
            let next_wallet = wallet.apply(&tx.action, now).map_err(|e| {
                tracing::error!(id = %id, error = %e, "executed action does not apply to stored wallet");
                CoordinatorError::invalid(format!("executed action no longer applies: {e}"))
            })?;

            let mut done = tx;
            done.status = TransactionStatus::Executed;
            done.pending_submission = None;
            done.execution = Some(record.clone());
            done.updated_at = now;
            self.store.commit_execution(&done, &next_wallet)?;
            Ok(Some(next_wallet))
        })?;

        if let Some(wallet) = committed {
            self.metrics.executions_succeeded.inc();
            tracing::info!(
                id = %id,
                wallet = %truncate_address(&wallet.address),
                nonce = wallet.nonce,
                signers = wallet.signer_count(),
                threshold = wallet.threshold,
                transaction_ref = %record.transaction_ref,
                block = record.block_number,
                "transaction executed"
            );
        }
        Ok(())
    }

    fn record_failure(
        &self,
        id: TransactionId,
        record: ExecutionRecord,
    ) -> Result<(), CoordinatorError> {
        retry_on_conflict(self.config.max_update_retries, "record failure", || {
            let mut tx = load_transaction(&*self.store, id)?;
            if tx.status.is_terminal() {
                return Ok(());
            }
            tx.status = TransactionStatus::Failed;
            tx.pending_submission = None;
            tx.execution = Some(record.clone());
            tx.updated_at = self.clock.now();
            self.store.update_transaction(&tx)?;
            Ok(())
        })?;
        self.metrics.executions_failed.inc();
        tracing::warn!(id = %id, transaction_ref = %record.transaction_ref, "execution reverted on-chain");
        Ok(())
    }

    fn upstream(&self, e: ContractError) -> CoordinatorError {
        self.metrics.upstream_errors.inc();
        CoordinatorError::UpstreamUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosign_nullables::{NullClock, NullContract, NullStore, SubmissionOutcome};
    use cosign_store::{NewTransaction, TransactionStore, WalletStore};
    use cosign_types::{Action, Signature, SignerEntry};

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    struct Fixture {
        store: Arc<NullStore>,
        contract: Arc<NullContract>,
        coordinator: ExecutionCoordinator<NullStore, NullContract>,
        id: TransactionId,
    }

    /// Wallet [1,2,3] threshold 2 at nonce 0 with one ready transfer.
    fn fixture() -> Fixture {
        let store = Arc::new(NullStore::new());
        let contract = Arc::new(NullContract::new());
        let wallet = Wallet::new(
            addr(0xAA),
            1,
            vec![addr(1), addr(2), addr(3)],
            2,
            None,
            cosign_types::Timestamp::new(0),
        )
        .unwrap();
        store.insert_wallet(&wallet).unwrap();
        contract.deploy(&wallet);

        let action = Action::TransferFunds {
            to: addr(9),
            amount: cosign_types::U256::from(5u64),
        };
        let call = cosign_contract::encode_action(wallet.address, &action);
        let mut tx = store
            .insert_transaction(NewTransaction {
                wallet_address: wallet.address,
                nonce: 0,
                action,
                call,
                signature_required_hash: TxHash::repeat_byte(1),
                proposed_by: addr(1),
                created_at: cosign_types::Timestamp::new(1),
            })
            .unwrap();
        // Signed by 3 then 2: execution must reorder by address.
        tx.signers = vec![
            SignerEntry {
                address: addr(3),
                signature: Signature::from(vec![3; 65]),
            },
            SignerEntry {
                address: addr(2),
                signature: Signature::from(vec![2; 65]),
            },
        ];
        tx.status = TransactionStatus::ReadyToExecute;
        let tx = store.update_transaction(&tx).unwrap();

        let config = CoordinatorConfig {
            receipt_poll_interval_ms: 5,
            receipt_timeout_secs: 1,
            ..CoordinatorConfig::default()
        };
        let coordinator = ExecutionCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&contract),
            Arc::new(NullClock::new(50)),
            config,
            Arc::new(CoordinatorMetrics::new()),
            Arc::new(WalletLocks::new()),
        );
        Fixture {
            store,
            contract,
            coordinator,
            id: tx.id,
        }
    }

    #[tokio::test]
    async fn success_advances_wallet_and_orders_signatures() {
        let f = fixture();
        let receipt = f.coordinator.execute(f.id, addr(1)).await.unwrap();
        assert!(receipt.success);

        let tx = f.store.get_transaction(f.id).unwrap();
        assert_eq!(tx.status, TransactionStatus::Executed);
        assert_eq!(tx.pending_submission, None);
        assert_eq!(tx.execution.unwrap().transaction_ref, receipt.transaction_ref);
        assert_eq!(f.store.get_wallet(&addr(0xAA)).unwrap().nonce, 1);

        let submitted = f.contract.submissions();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].signatures[0], Signature::from(vec![2; 65]));
        assert_eq!(submitted[0].signatures[1], Signature::from(vec![3; 65]));
        assert_eq!(submitted[0].call.to, addr(9));
    }

    #[tokio::test]
    async fn second_execute_is_stale() {
        let f = fixture();
        f.coordinator.execute(f.id, addr(1)).await.unwrap();
        assert!(matches!(
            f.coordinator.execute(f.id, addr(1)).await,
            Err(CoordinatorError::Stale { .. })
        ));
        assert_eq!(f.store.get_wallet(&addr(0xAA)).unwrap().nonce, 1);
        assert_eq!(f.contract.submission_count(), 1);
    }

    #[tokio::test]
    async fn revert_marks_failed_and_keeps_wallet() {
        let f = fixture();
        f.contract.set_outcome(SubmissionOutcome::Revert);
        let err = f.coordinator.execute(f.id, addr(1)).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::ExecutionFailed { .. }));
        assert_eq!(
            f.store.get_transaction(f.id).unwrap().status,
            TransactionStatus::Failed
        );
        assert_eq!(f.store.get_wallet(&addr(0xAA)).unwrap().nonce, 0);
    }

    #[tokio::test]
    async fn rejection_leaves_transaction_ready() {
        let f = fixture();
        f.contract.set_outcome(SubmissionOutcome::Reject);
        let err = f.coordinator.execute(f.id, addr(1)).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::SubmissionRejected(_)));
        assert!(err.is_retryable());
        assert_eq!(
            f.store.get_transaction(f.id).unwrap().status,
            TransactionStatus::ReadyToExecute
        );

        f.contract.set_outcome(SubmissionOutcome::Success);
        f.coordinator.execute(f.id, addr(1)).await.unwrap();
        assert_eq!(f.store.get_wallet(&addr(0xAA)).unwrap().nonce, 1);
    }

    #[tokio::test]
    async fn missing_receipt_is_reconciled_on_retry() {
        let f = fixture();
        f.contract.withhold_receipts(true);
        let err = f.coordinator.execute(f.id, addr(1)).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::UpstreamUnavailable(_)));

        let tx = f.store.get_transaction(f.id).unwrap();
        assert_eq!(tx.status, TransactionStatus::ReadyToExecute);
        assert!(tx.pending_submission.is_some());
        assert_eq!(f.store.get_wallet(&addr(0xAA)).unwrap().nonce, 0);

        f.contract.release_receipts();
        f.coordinator.execute(f.id, addr(1)).await.unwrap();
        assert_eq!(f.contract.submission_count(), 1);
        assert_eq!(f.store.get_wallet(&addr(0xAA)).unwrap().nonce, 1);
    }

    #[tokio::test]
    async fn unmined_submission_is_never_resubmitted() {
        let f = fixture();
        f.contract.hold_in_mempool(true);

        let err = f.coordinator.execute(f.id, addr(1)).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::UpstreamUnavailable(_)));
        let first = f.store.get_transaction(f.id).unwrap().pending_submission;
        assert!(first.is_some());

        // Still in the mempool with the on-chain nonce unchanged.
        let err = f.coordinator.execute(f.id, addr(1)).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::UpstreamUnavailable(_)));
        assert_eq!(f.contract.submission_count(), 1);
        assert_eq!(f.store.get_transaction(f.id).unwrap().pending_submission, first);

        f.contract.mine();
        let receipt = f.coordinator.execute(f.id, addr(1)).await.unwrap();
        assert!(receipt.success);
        assert_eq!(Some(receipt.transaction_ref), first);
        assert_eq!(f.contract.submission_count(), 1);
        assert_eq!(f.contract.onchain_nonce(addr(0xAA)), Some(1));
        assert_eq!(f.store.get_wallet(&addr(0xAA)).unwrap().nonce, 1);
        assert_eq!(
            f.store.get_transaction(f.id).unwrap().status,
            TransactionStatus::Executed
        );
    }

    #[tokio::test]
    async fn onchain_nonce_mismatch_is_stale() {
        let f = fixture();
        f.contract.set_nonce(addr(0xAA), 4);
        assert!(matches!(
            f.coordinator.execute(f.id, addr(1)).await,
            Err(CoordinatorError::Stale {
                transaction_nonce: 0,
                wallet_nonce: 4
            })
        ));
        assert_eq!(f.contract.submission_count(), 0);
    }

    #[tokio::test]
    async fn not_ready_is_rejected_before_submission() {
        let f = fixture();
        let mut tx = f.store.get_transaction(f.id).unwrap();
        tx.signers.truncate(1);
        tx.status = TransactionStatus::Pending;
        f.store.update_transaction(&tx).unwrap();

        assert!(matches!(
            f.coordinator.execute(f.id, addr(1)).await,
            Err(CoordinatorError::NotReady { .. })
        ));
        assert_eq!(f.contract.submission_count(), 0);
    }
}
