use cosign_types::Address;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-wallet execution lock.
/// Executions on different wallets proceed concurrently.
/// Executions on the same wallet are serialized.
#[derive(Default)]
pub struct WalletLocks {
    wallet_locks: Mutex<HashMap<Address, Arc<Mutex<()>>>>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the lock for a specific wallet.
    async fn wallet_lock(&self, wallet: Address) -> Arc<Mutex<()>> {
        let mut locks = self.wallet_locks.lock().await;
        locks
            .entry(wallet)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to `wallet`; released when the guard drops.
    pub async fn acquire(&self, wallet: Address) -> OwnedMutexGuard<()> {
        self.wallet_lock(wallet).await.lock_owned().await
    }

    /// Run `fut` while holding the wallet's lock.
    pub async fn serialize<F, R>(&self, wallet: Address, fut: F) -> R
    where
        F: Future<Output = R>,
    {
        let _guard = self.acquire(wallet).await;
        fut.await
    }

    /// Number of wallets that currently have a lock entry.
    pub async fn active_wallets(&self) -> usize {
        self.wallet_locks.lock().await.len()
    }

    /// Drop lock entries nobody holds or waits on.
    pub async fn cleanup(&self) {
        let mut locks = self.wallet_locks.lock().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
