//! LMDB implementation of WalletStore.

use cosign_store::{StoreError, WalletStore};
use cosign_types::{Address, Wallet};

use crate::environment::{decode, encode};
use crate::{LmdbEnvironment, LmdbError};

impl WalletStore for LmdbEnvironment {
    fn insert_wallet(&self, wallet: &Wallet) -> Result<(), StoreError> {
        let bytes = encode(wallet)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .wallets_db
            .get(&wtxn, wallet.address.as_slice())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!("wallet {}", wallet.address)));
        }
        self.wallets_db
            .put(&mut wtxn, wallet.address.as_slice(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_wallet(&self, address: &Address) -> Result<Wallet, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .wallets_db
            .get(&rtxn, address.as_slice())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("wallet {}", address)))?;
        Ok(decode(val)?)
    }

    fn wallet_exists(&self, address: &Address) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .wallets_db
            .get(&rtxn, address.as_slice())
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn wallets_with_signer(&self, signer: &Address) -> Result<Vec<Wallet>, StoreError> {
        Ok(self
            .iter_wallets()?
            .into_iter()
            .filter(|w| w.is_signer(signer))
            .collect())
    }

    fn iter_wallets(&self) -> Result<Vec<Wallet>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut wallets = Vec::new();
        let iter = self.wallets_db.iter(&rtxn).map_err(LmdbError::from)?;
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            wallets.push(decode(val)?);
        }
        Ok(wallets)
    }
}
