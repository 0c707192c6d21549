//! Transaction storage trait.

use crate::{StoreError, TransactionQuery};
use cosign_types::{
    Action, Address, ContractCall, Timestamp, Transaction, TransactionId, TransactionStatus,
    TxHash,
};

/// A transaction document before the store assigns its id.
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub wallet_address: Address,
    pub nonce: u64,
    pub action: Action,
    pub call: ContractCall,
    pub signature_required_hash: TxHash,
    pub proposed_by: Address,
    pub created_at: Timestamp,
}

impl NewTransaction {
    /// The stored document: `Proposed`, no signers, version 0.
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            wallet_address: self.wallet_address,
            nonce: self.nonce,
            action: self.action,
            call: self.call,
            signature_required_hash: self.signature_required_hash,
            signers: Vec::new(),
            status: TransactionStatus::Proposed,
            proposed_by: self.proposed_by,
            created_at: self.created_at,
            updated_at: self.created_at,
            version: 0,
            pending_submission: None,
            execution: None,
        }
    }
}

/// Trait for transaction document storage.
pub trait TransactionStore: Send + Sync {
    /// Assign an id and store a new transaction.
    fn insert_transaction(&self, new: NewTransaction) -> Result<Transaction, StoreError>;

    fn get_transaction(&self, id: TransactionId) -> Result<Transaction, StoreError>;

    /// Compare-and-swap write.
    ///
    /// Succeeds only if the stored version equals `tx.version`; the stored
    /// copy gets `version + 1`, which is returned. Otherwise `Conflict`.
    fn update_transaction(&self, tx: &Transaction) -> Result<Transaction, StoreError>;

    /// Equality filters plus ordering by creation time (ties broken by id).
    fn query_transactions(&self, query: &TransactionQuery)
        -> Result<Vec<Transaction>, StoreError>;
}
