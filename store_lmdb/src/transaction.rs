//! LMDB implementation of TransactionStore.

use cosign_store::{NewTransaction, StoreError, TransactionQuery, TransactionStore};
use cosign_types::{Address, Transaction, TransactionId};
use heed::RoTxn;

use crate::environment::{decode, encode};
use crate::meta::next_transaction_id;
use crate::{LmdbEnvironment, LmdbError};

/// Index key: wallet ‖ nonce ‖ id, so a wallet (or one of its nonce slots)
/// is a contiguous key prefix.
pub(crate) fn index_key(wallet: &Address, nonce: u64, id: TransactionId) -> Vec<u8> {
    let mut key = index_prefix(wallet, Some(nonce));
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn index_prefix(wallet: &Address, nonce: Option<u64>) -> Vec<u8> {
    let mut key = Vec::with_capacity(36);
    key.extend_from_slice(wallet.as_slice());
    if let Some(nonce) = nonce {
        key.extend_from_slice(&nonce.to_be_bytes());
    }
    key
}

impl LmdbEnvironment {
    pub(crate) fn read_transaction(
        &self,
        txn: &RoTxn,
        id: TransactionId,
    ) -> Result<Transaction, LmdbError> {
        let val = self
            .transactions_db
            .get(txn, &id.to_be_bytes())?
            .ok_or_else(|| LmdbError::NotFound(format!("transaction {}", id)))?;
        decode(val)
    }

    fn ids_for_wallet(
        &self,
        txn: &RoTxn,
        wallet: &Address,
        nonce: Option<u64>,
    ) -> Result<Vec<TransactionId>, LmdbError> {
        let prefix = index_prefix(wallet, nonce);
        let mut ids = Vec::new();
        for result in self.wallet_tx_db.prefix_iter(txn, &prefix)? {
            let (key, _) = result?;
            let arr: [u8; 8] = key[key.len() - 8..]
                .try_into()
                .map_err(|_| LmdbError::Serialization("invalid index key length".into()))?;
            ids.push(TransactionId(u64::from_be_bytes(arr)));
        }
        Ok(ids)
    }
}

impl TransactionStore for LmdbEnvironment {
    fn insert_transaction(&self, new: NewTransaction) -> Result<Transaction, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let id = TransactionId(next_transaction_id(self, &mut wtxn)?);
        let tx = new.into_transaction(id);
        let bytes = encode(&tx)?;
        self.transactions_db
            .put(&mut wtxn, &id.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        self.wallet_tx_db
            .put(&mut wtxn, &index_key(&tx.wallet_address, tx.nonce, id), &[])
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(tx)
    }

    fn get_transaction(&self, id: TransactionId) -> Result<Transaction, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.read_transaction(&rtxn, id)?)
    }

    fn update_transaction(&self, tx: &Transaction) -> Result<Transaction, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let stored = self.read_transaction(&wtxn, tx.id)?;
        if stored.version != tx.version {
            return Err(StoreError::Conflict(format!(
                "transaction {} is at version {}, write was based on {}",
                tx.id, stored.version, tx.version
            )));
        }
        let mut next = tx.clone();
        next.version = stored.version + 1;
        let bytes = encode(&next)?;
        self.transactions_db
            .put(&mut wtxn, &tx.id.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(next)
    }

    fn query_transactions(
        &self,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut txs = Vec::new();
        match query.wallet {
            Some(wallet) => {
                for id in self.ids_for_wallet(&rtxn, &wallet, query.nonce)? {
                    let tx = self.read_transaction(&rtxn, id)?;
                    if query.matches(&tx) {
                        txs.push(tx);
                    }
                }
            }
            None => {
                let iter = self.transactions_db.iter(&rtxn).map_err(LmdbError::from)?;
                for result in iter {
                    let (_key, val) = result.map_err(LmdbError::from)?;
                    let tx: Transaction = decode(val)?;
                    if query.matches(&tx) {
                        txs.push(tx);
                    }
                }
            }
        }
        Ok(query.finish(txs))
    }
}
