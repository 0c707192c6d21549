//! LMDB implementation of ExecutionStore.

use cosign_store::execution::check_execution_preconditions;
use cosign_store::{ExecutionStore, StoreError};
use cosign_types::{Transaction, Wallet};

use crate::environment::{decode, encode};
use crate::{LmdbEnvironment, LmdbError};

impl ExecutionStore for LmdbEnvironment {
    fn commit_execution(&self, tx: &Transaction, wallet: &Wallet) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let stored_wallet: Wallet = {
            let val = self
                .wallets_db
                .get(&wtxn, wallet.address.as_slice())
                .map_err(LmdbError::from)?
                .ok_or_else(|| LmdbError::NotFound(format!("wallet {}", wallet.address)))?;
            decode(val)?
        };
        let stored_tx = self.read_transaction(&wtxn, tx.id)?;
        check_execution_preconditions(&stored_wallet, &stored_tx, tx, wallet)?;

        let mut next_tx = tx.clone();
        next_tx.version = stored_tx.version + 1;

        let tx_bytes = encode(&next_tx)?;
        let wallet_bytes = encode(wallet)?;
        self.transactions_db
            .put(&mut wtxn, &tx.id.to_be_bytes(), &tx_bytes)
            .map_err(LmdbError::from)?;
        self.wallets_db
            .put(&mut wtxn, wallet.address.as_slice(), &wallet_bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(
            transaction = %tx.id,
            wallet = %wallet.address,
            nonce = wallet.nonce,
            "committed execution"
        );
        Ok(())
    }
}
