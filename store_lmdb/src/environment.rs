//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::meta;
use crate::LmdbError;

/// Number of named databases the environment is opened with.
pub const MAX_DBS: u32 = 8;

/// Wraps the LMDB environment and all database handles.
///
/// Implements [`cosign_store::WalletStore`], [`cosign_store::TransactionStore`]
/// and [`cosign_store::ExecutionStore`].
#[derive(Clone)]
pub struct LmdbEnvironment {
    pub(crate) env: Env,
    /// wallet address (20 bytes) → wallet JSON
    pub(crate) wallets_db: Database<Bytes, Bytes>,
    /// transaction id (u64 BE) → transaction JSON
    pub(crate) transactions_db: Database<Bytes, Bytes>,
    /// wallet (20) ‖ nonce (u64 BE) ‖ id (u64 BE) → empty
    pub(crate) wallet_tx_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment directory is owned by this process; no other
        // handle to the same files is opened with different options.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let wallets_db = env.create_database(&mut wtxn, Some("wallets"))?;
        let transactions_db = env.create_database(&mut wtxn, Some("transactions"))?;
        let wallet_tx_db = env.create_database(&mut wtxn, Some("wallet_transactions"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let store = Self {
            env,
            wallets_db,
            transactions_db,
            wallet_tx_db,
            meta_db,
        };
        meta::ensure_schema(&store)?;
        tracing::info!(path = %path.display(), "opened LMDB environment");
        Ok(store)
    }
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    serde_json::to_vec(value).map_err(|e| LmdbError::Serialization(e.to_string()))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    serde_json::from_slice(bytes).map_err(|e| LmdbError::Serialization(e.to_string()))
}
