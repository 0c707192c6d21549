//! Creating, superseding and cancelling proposals.

use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::hash_builder::HashBuilder;
use crate::metrics::CoordinatorMetrics;
use crate::retry::retry_on_conflict;
use crate::wallet_state::load_wallet;
use cosign_contract::{encode_action, MultisigContract};
use cosign_store::{NewTransaction, StoreError, TransactionQuery, TransactionStore, WalletStore};
use cosign_types::{
    is_zero_address, Action, Address, Clock, Transaction, TransactionId, TransactionStatus,
    Wallet, U256,
};
use cosign_utils::truncate_address;
use std::sync::Arc;

/// Check `action` proposed by `proposer` against the current `wallet`.
///
/// Pure; runs before any network call or store write.
pub fn validate_action(
    wallet: &Wallet,
    action: &Action,
    proposer: Address,
) -> Result<(), CoordinatorError> {
    if !wallet.is_signer(&proposer) {
        return Err(CoordinatorError::invalid(format!(
            "{proposer} is not a signer of {}",
            wallet.address
        )));
    }

    let signers = wallet.signer_count() as u32;
    match action {
        Action::AddSigner {
            signer,
            new_threshold,
        } => {
            if is_zero_address(signer) {
                return Err(CoordinatorError::invalid("zero address cannot be a signer"));
            }
            if wallet.is_signer(signer) {
                return Err(CoordinatorError::invalid(format!("{signer} is already a signer")));
            }
            if *signer == proposer {
                return Err(CoordinatorError::invalid("cannot add yourself as a signer"));
            }
            check_threshold(*new_threshold, signers + 1)?;
        }
        Action::RemoveSigner {
            signer,
            new_threshold,
        } => {
            if !wallet.is_signer(signer) {
                return Err(CoordinatorError::invalid(format!("{signer} is not a signer")));
            }
            if *signer == proposer {
                return Err(CoordinatorError::invalid("cannot remove yourself as a signer"));
            }
            check_threshold(*new_threshold, signers - 1)?;
        }
        Action::OpenStream {
            to,
            amount,
            frequency,
        } => {
            if !wallet.is_signer(to) {
                return Err(CoordinatorError::invalid(format!(
                    "streams can only be opened to signers, {to} is not one"
                )));
            }
            if wallet.has_open_stream(to) {
                return Err(CoordinatorError::invalid(format!(
                    "{to} already has an open stream"
                )));
            }
            if *amount == U256::ZERO {
                return Err(CoordinatorError::invalid("stream amount must be positive"));
            }
            if *frequency == U256::ZERO {
                return Err(CoordinatorError::invalid("stream frequency must be positive"));
            }
        }
        Action::CloseStream { to } => {
            if !wallet.is_signer(to) {
                return Err(CoordinatorError::invalid(format!("{to} is not a signer")));
            }
            if !wallet.has_open_stream(to) {
                return Err(CoordinatorError::invalid(format!("{to} has no open stream")));
            }
        }
        Action::TransferFunds { to, .. } => {
            if is_zero_address(to) {
                return Err(CoordinatorError::invalid(
                    "transfer destination cannot be the zero address",
                ));
            }
        }
    }
    Ok(())
}

fn check_threshold(threshold: u32, signers_after: u32) -> Result<(), CoordinatorError> {
    if threshold == 0 || threshold > signers_after {
        return Err(CoordinatorError::invalid(format!(
            "signatures required must be between 1 and {signers_after}, got {threshold}"
        )));
    }
    Ok(())
}

pub(crate) fn load_transaction<S: TransactionStore + ?Sized>(
    store: &S,
    id: TransactionId,
) -> Result<Transaction, CoordinatorError> {
    match store.get_transaction(id) {
        Ok(tx) => Ok(tx),
        Err(StoreError::NotFound(_)) => Err(CoordinatorError::TransactionNotFound(id)),
        Err(e) => Err(e.into()),
    }
}

pub struct ProposalManager<S, C> {
    store: Arc<S>,
    hashes: HashBuilder<C>,
    clock: Arc<dyn Clock>,
    config: CoordinatorConfig,
    metrics: Arc<CoordinatorMetrics>,
}

impl<S, C> ProposalManager<S, C>
where
    S: WalletStore + TransactionStore,
    C: MultisigContract,
{
    pub fn new(
        store: Arc<S>,
        hashes: HashBuilder<C>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
        metrics: Arc<CoordinatorMetrics>,
    ) -> Self {
        Self {
            store,
            hashes,
            clock,
            config,
            metrics,
        }
    }

    /// Create a proposal for `action` at the wallet's current nonce.
    ///
    /// Earlier `proposed`/`pending` proposals at the same nonce are cancelled
    /// afterwards; a sibling that already reached `readyToExecute` is left
    /// alone. The proposer does not sign implicitly.
    pub async fn propose(
        &self,
        wallet_address: Address,
        action: Action,
        proposer: Address,
    ) -> Result<Transaction, CoordinatorError> {
        let wallet = load_wallet(&*self.store, &wallet_address)?;
        validate_action(&wallet, &action, proposer)?;

        let call = encode_action(wallet.address, &action);
        let hash = match self
            .hashes
            .build_transaction_hash(&wallet, wallet.nonce, &call)
            .await
        {
            Ok(hash) => hash,
            Err(e) => {
                self.metrics.upstream_errors.inc();
                return Err(e);
            }
        };

        let tx = self.store.insert_transaction(NewTransaction {
            wallet_address: wallet.address,
            nonce: wallet.nonce,
            action,
            call,
            signature_required_hash: hash,
            proposed_by: proposer,
            created_at: self.clock.now(),
        })?;
        self.metrics.proposals_created.inc();
        tracing::info!(
            id = %tx.id,
            wallet = %truncate_address(&tx.wallet_address),
            nonce = tx.nonce,
            action = %tx.action.kind(),
            proposer = %truncate_address(&proposer),
            "proposal created"
        );

        self.supersede_siblings(&tx);
        Ok(tx)
    }

    /// Cancel the earlier open proposals in `tx`'s (wallet, nonce) slot.
    /// Ids are monotonic, so a newer sibling is never touched.
    fn supersede_siblings(&self, tx: &Transaction) {
        let siblings = match self
            .store
            .query_transactions(&TransactionQuery::for_slot(tx.wallet_address, tx.nonce))
        {
            Ok(siblings) => siblings,
            Err(e) => {
                tracing::warn!(id = %tx.id, error = %e, "could not list same-nonce proposals");
                return;
            }
        };

        for sibling in siblings.into_iter().filter(|s| s.id < tx.id) {
            let id = sibling.id;
            let result = retry_on_conflict(self.config.max_update_retries, "supersede", || {
                let current = load_transaction(&*self.store, id)?;
                match current.status {
                    TransactionStatus::Proposed | TransactionStatus::Pending => {}
                    TransactionStatus::ReadyToExecute => {
                        tracing::info!(id = %id, superseded_by = %tx.id, "same-nonce proposal is ready to execute, leaving it");
                        return Ok(false);
                    }
                    _ => return Ok(false),
                }
                self.write_cancelled(current).map(|_| true)
            });
            match result {
                Ok(true) => {
                    self.metrics.proposals_cancelled.inc();
                    tracing::info!(id = %id, superseded_by = %tx.id, "same-nonce proposal cancelled");
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(id = %id, superseded_by = %tx.id, error = %e, "could not cancel same-nonce proposal");
                }
            }
        }
    }

    /// Withdraw a proposal that has not reached `readyToExecute`.
    pub fn cancel(
        &self,
        id: TransactionId,
        requester: Address,
    ) -> Result<Transaction, CoordinatorError> {
        let cancelled = retry_on_conflict(self.config.max_update_retries, "cancel", || {
            let tx = load_transaction(&*self.store, id)?;
            let wallet = load_wallet(&*self.store, &tx.wallet_address)?;
            if !wallet.is_signer(&requester) {
                return Err(CoordinatorError::NotAuthorizedSigner {
                    signer: requester,
                    wallet: wallet.address,
                });
            }
            if !tx.status.is_signable() {
                return Err(CoordinatorError::NotCancellable {
                    id,
                    status: tx.status,
                });
            }
            self.write_cancelled(tx)
        })?;

        self.metrics.proposals_cancelled.inc();
        tracing::info!(id = %id, requester = %truncate_address(&requester), "proposal cancelled");
        Ok(cancelled)
    }

    fn write_cancelled(&self, mut tx: Transaction) -> Result<Transaction, CoordinatorError> {
        tx.status = TransactionStatus::Cancelled;
        tx.updated_at = self.clock.now();
        self.store.update_transaction(&tx).map_err(|e| {
            if matches!(e, StoreError::Conflict(_)) {
                self.metrics.update_conflicts.inc();
            }
            e.into()
        })
    }
}
