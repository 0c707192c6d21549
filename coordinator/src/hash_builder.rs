use crate::error::CoordinatorError;
use cosign_contract::MultisigContract;
use cosign_types::{ContractCall, TxHash, Wallet};
use std::sync::Arc;

/// Derives the signature-required hash of a call through the wallet's own
/// `getTransactionHash`, so signatures bind to exactly what the contract
/// will check at execution.
pub struct HashBuilder<C> {
    contract: Arc<C>,
}

impl<C> Clone for HashBuilder<C> {
    fn clone(&self) -> Self {
        Self {
            contract: Arc::clone(&self.contract),
        }
    }
}

impl<C: MultisigContract> HashBuilder<C> {
    pub fn new(contract: Arc<C>) -> Self {
        Self { contract }
    }

    /// Any provider failure is reported as `UpstreamUnavailable`; a
    /// reverted view call is not the caller's fault.
    pub async fn build_transaction_hash(
        &self,
        wallet: &Wallet,
        nonce: u64,
        call: &ContractCall,
    ) -> Result<TxHash, CoordinatorError> {
        self.contract
            .transaction_hash(wallet.address, nonce, call)
            .await
            .map_err(|e| {
                tracing::warn!(wallet = %wallet.address, nonce, error = %e, "getTransactionHash failed");
                CoordinatorError::UpstreamUnavailable(e.to_string())
            })
    }
}
