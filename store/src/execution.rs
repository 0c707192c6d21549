//! The one write that touches both entity kinds.

use crate::{StoreError, TransactionStore, WalletStore};
use cosign_types::{Transaction, Wallet};

/// Atomic reconciliation of an executed transaction.
pub trait ExecutionStore: WalletStore + TransactionStore {
    /// Persist the executed transaction and the advanced wallet in one write.
    ///
    /// Preconditions checked inside the write:
    /// - the stored wallet's nonce equals `wallet.nonce - 1` and `tx.nonce`;
    /// - the stored transaction's version equals `tx.version`.
    ///
    /// On any mismatch nothing is written and `Conflict` is returned. Both
    /// stored documents get their new values (transaction version bumped).
    fn commit_execution(&self, tx: &Transaction, wallet: &Wallet) -> Result<(), StoreError>;
}

/// Shared precondition check for `commit_execution` implementations.
pub fn check_execution_preconditions(
    stored_wallet: &Wallet,
    stored_tx: &Transaction,
    tx: &Transaction,
    wallet: &Wallet,
) -> Result<(), StoreError> {
    if stored_tx.version != tx.version {
        return Err(StoreError::Conflict(format!(
            "transaction {} version {} != {}",
            tx.id, stored_tx.version, tx.version
        )));
    }
    if stored_wallet.nonce != tx.nonce || wallet.nonce != tx.nonce + 1 {
        return Err(StoreError::Conflict(format!(
            "wallet {} nonce {} cannot advance to {} for transaction nonce {}",
            wallet.address, stored_wallet.nonce, wallet.nonce, tx.nonce
        )));
    }
    Ok(())
}
