//! Wallet storage trait.

use crate::StoreError;
use cosign_types::{Address, Wallet};

/// Trait for wallet document storage.
///
/// Wallets are only ever created here; their state changes go through
/// [`crate::ExecutionStore::commit_execution`].
pub trait WalletStore: Send + Sync {
    /// Store a newly registered wallet. Fails with `Duplicate` if the address exists.
    fn insert_wallet(&self, wallet: &Wallet) -> Result<(), StoreError>;

    fn get_wallet(&self, address: &Address) -> Result<Wallet, StoreError>;

    fn wallet_exists(&self, address: &Address) -> Result<bool, StoreError>;

    /// All wallets whose signer set contains `signer`.
    fn wallets_with_signer(&self, signer: &Address) -> Result<Vec<Wallet>, StoreError>;

    fn iter_wallets(&self) -> Result<Vec<Wallet>, StoreError>;
}
