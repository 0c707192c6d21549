//! Nullable store: thread-safe in-memory storage for testing.

use cosign_store::execution::check_execution_preconditions;
use cosign_store::{
    ExecutionStore, NewTransaction, StoreError, TransactionQuery, TransactionStore, WalletStore,
};
use cosign_types::{Address, Transaction, TransactionId, Wallet};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    wallets: HashMap<Address, Wallet>,
    transactions: BTreeMap<TransactionId, Transaction>,
    next_id: u64,
}

/// An in-memory wallet + transaction store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
///
/// Both tables sit behind one mutex so `commit_execution` is atomic the
/// same way a single LMDB write transaction is.
pub struct NullStore {
    tables: Mutex<Tables>,
    injected_conflicts: Mutex<usize>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables {
                next_id: 1,
                ..Tables::default()
            }),
            injected_conflicts: Mutex::new(0),
        }
    }

    /// Make the next `count` calls to `update_transaction` fail with
    /// `Conflict`, as if another writer got there first.
    pub fn inject_conflicts(&self, count: usize) {
        *self.injected_conflicts.lock().unwrap() = count;
    }

    pub fn transaction_count(&self) -> usize {
        self.tables.lock().unwrap().transactions.len()
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletStore for NullStore {
    fn insert_wallet(&self, wallet: &Wallet) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.wallets.contains_key(&wallet.address) {
            return Err(StoreError::Duplicate(wallet.address.to_string()));
        }
        tables.wallets.insert(wallet.address, wallet.clone());
        Ok(())
    }

    fn get_wallet(&self, address: &Address) -> Result<Wallet, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .wallets
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(address.to_string()))
    }

    fn wallet_exists(&self, address: &Address) -> Result<bool, StoreError> {
        Ok(self.tables.lock().unwrap().wallets.contains_key(address))
    }

    fn wallets_with_signer(&self, signer: &Address) -> Result<Vec<Wallet>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .wallets
            .values()
            .filter(|w| w.is_signer(signer))
            .cloned()
            .collect())
    }

    fn iter_wallets(&self) -> Result<Vec<Wallet>, StoreError> {
        Ok(self.tables.lock().unwrap().wallets.values().cloned().collect())
    }
}

impl TransactionStore for NullStore {
    fn insert_transaction(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let id = TransactionId(tables.next_id);
        tables.next_id += 1;
        let tx = new.into_transaction(id);
        tables.transactions.insert(id, tx.clone());
        Ok(tx)
    }

    fn get_transaction(&self, id: TransactionId) -> Result<Transaction, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .transactions
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("transaction {id}")))
    }

    fn update_transaction(&self, tx: &Transaction) -> Result<Transaction, StoreError> {
        {
            let mut injected = self.injected_conflicts.lock().unwrap();
            if *injected > 0 {
                *injected -= 1;
                return Err(StoreError::Conflict(format!("transaction {} (injected)", tx.id)));
            }
        }

        let mut tables = self.tables.lock().unwrap();
        let stored = tables
            .transactions
            .get_mut(&tx.id)
            .ok_or_else(|| StoreError::NotFound(format!("transaction {}", tx.id)))?;
        if stored.version != tx.version {
            return Err(StoreError::Conflict(format!(
                "transaction {} version {} != {}",
                tx.id, stored.version, tx.version
            )));
        }
        let mut next = tx.clone();
        next.version += 1;
        *stored = next.clone();
        Ok(next)
    }

    fn query_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, StoreError> {
        let matching = self
            .tables
            .lock()
            .unwrap()
            .transactions
            .values()
            .filter(|tx| query.matches(tx))
            .cloned()
            .collect();
        Ok(query.finish(matching))
    }
}

impl ExecutionStore for NullStore {
    fn commit_execution(&self, tx: &Transaction, wallet: &Wallet) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let stored_wallet = tables
            .wallets
            .get(&wallet.address)
            .ok_or_else(|| StoreError::NotFound(wallet.address.to_string()))?;
        let stored_tx = tables
            .transactions
            .get(&tx.id)
            .ok_or_else(|| StoreError::NotFound(format!("transaction {}", tx.id)))?;
        check_execution_preconditions(stored_wallet, stored_tx, tx, wallet)?;

        let mut next = tx.clone();
        next.version += 1;
        tables.transactions.insert(tx.id, next);
        tables.wallets.insert(wallet.address, wallet.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosign_types::{Action, Bytes, ContractCall, Timestamp, TransactionStatus, TxHash, U256};

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn wallet() -> Wallet {
        Wallet::new(addr(0xAA), 1, vec![addr(1), addr(2)], 1, None, Timestamp::new(0)).unwrap()
    }

    fn new_tx(nonce: u64, created: u64) -> NewTransaction {
        NewTransaction {
            wallet_address: addr(0xAA),
            nonce,
            action: Action::TransferFunds {
                to: addr(9),
                amount: U256::from(1u64),
            },
            call: ContractCall {
                to: addr(9),
                value: U256::from(1u64),
                data: Bytes::new(),
            },
            signature_required_hash: TxHash::repeat_byte(7),
            proposed_by: addr(1),
            created_at: Timestamp::new(created),
        }
    }

    #[test]
    fn test_wallet_roundtrip() {
        let store = NullStore::new();
        let w = wallet();
        store.insert_wallet(&w).unwrap();
        assert_eq!(store.get_wallet(&w.address).unwrap(), w);
        assert!(store.insert_wallet(&w).is_err());
        assert_eq!(store.wallets_with_signer(&addr(2)).unwrap().len(), 1);
        assert!(store.wallets_with_signer(&addr(3)).unwrap().is_empty());
    }

    #[test]
    fn test_update_bumps_version_and_rejects_stale() {
        let store = NullStore::new();
        let tx = store.insert_transaction(new_tx(0, 1)).unwrap();
        assert_eq!(tx.id, TransactionId(1));

        let mut edit = tx.clone();
        edit.status = TransactionStatus::Pending;
        assert_eq!(store.update_transaction(&edit).unwrap().version, 1);
        assert!(matches!(
            store.update_transaction(&edit),
            Err(StoreError::Conflict(_))
        ));
    }

    #[test]
    fn test_injected_conflicts_are_consumed() {
        let store = NullStore::new();
        let tx = store.insert_transaction(new_tx(0, 1)).unwrap();
        store.inject_conflicts(1);
        assert!(store.update_transaction(&tx).is_err());
        assert!(store.update_transaction(&tx).is_ok());
    }

    #[test]
    fn test_query_orders_by_creation() {
        let store = NullStore::new();
        store.insert_transaction(new_tx(0, 30)).unwrap();
        store.insert_transaction(new_tx(0, 10)).unwrap();
        store.insert_transaction(new_tx(1, 20)).unwrap();
        let slot = store
            .query_transactions(&TransactionQuery::for_slot(addr(0xAA), 0))
            .unwrap();
        assert_eq!(
            slot.iter().map(|t| t.created_at.as_secs()).collect::<Vec<_>>(),
            vec![10, 30]
        );
        assert_eq!(store.transaction_count(), 3);
    }

    #[test]
    fn test_commit_execution_is_all_or_nothing() {
        let store = NullStore::new();
        let w = wallet();
        store.insert_wallet(&w).unwrap();
        let tx = store.insert_transaction(new_tx(0, 1)).unwrap();

        // Wrong target nonce: nothing is written.
        let mut bad = w.clone();
        bad.nonce = 5;
        assert!(store.commit_execution(&tx, &bad).is_err());
        assert_eq!(store.get_wallet(&w.address).unwrap().nonce, 0);
        assert_eq!(store.get_transaction(tx.id).unwrap().version, 0);

        let mut good = w.clone();
        good.nonce = 1;
        let mut done = tx.clone();
        done.status = TransactionStatus::Executed;
        store.commit_execution(&done, &good).unwrap();
        assert_eq!(store.get_wallet(&w.address).unwrap().nonce, 1);
        assert_eq!(
            store.get_transaction(tx.id).unwrap().status,
            TransactionStatus::Executed
        );
    }
}
