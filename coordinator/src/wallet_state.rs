//! Registration and reads of the authoritative wallet records.
//!
//! Wallets change after registration only through
//! `ExecutionStore::commit_execution`.

use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::metrics::CoordinatorMetrics;
use cosign_contract::MultisigContract;
use cosign_store::{StoreError, WalletStore};
use cosign_types::{Address, Clock, TxHash, Wallet};
use cosign_utils::truncate_address;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything needed to register an already deployed wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRegistration {
    pub address: Address,
    pub chain_id: u64,
    pub signers: Vec<Address>,
    pub threshold: u32,
    #[serde(default)]
    pub deployment_tx: Option<TxHash>,
}

pub struct WalletRegistry<S, C> {
    store: Arc<S>,
    contract: Arc<C>,
    clock: Arc<dyn Clock>,
    config: CoordinatorConfig,
    metrics: Arc<CoordinatorMetrics>,
}

impl<S: WalletStore, C: MultisigContract> WalletRegistry<S, C> {
    pub fn new(
        store: Arc<S>,
        contract: Arc<C>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
        metrics: Arc<CoordinatorMetrics>,
    ) -> Self {
        Self {
            store,
            contract,
            clock,
            config,
            metrics,
        }
    }

    /// Record a deployed wallet at nonce 0.
    ///
    /// The signer set must be non-empty, distinct and free of the zero
    /// address, with `1 <= threshold <= signers`. When
    /// `verify_registration` is set the deployed contract must agree on the
    /// threshold and on every signer.
    pub async fn register_wallet(
        &self,
        registration: WalletRegistration,
    ) -> Result<Wallet, CoordinatorError> {
        let wallet = Wallet::new(
            registration.address,
            registration.chain_id,
            registration.signers,
            registration.threshold,
            registration.deployment_tx,
            self.clock.now(),
        )
        .map_err(|e| CoordinatorError::invalid(e.to_string()))?;

        if self.store.wallet_exists(&wallet.address)? {
            return Err(CoordinatorError::AlreadyRegistered(wallet.address));
        }

        if self.config.verify_registration {
            self.verify_against_contract(&wallet).await?;
        }

        match self.store.insert_wallet(&wallet) {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => {
                return Err(CoordinatorError::AlreadyRegistered(wallet.address))
            }
            Err(e) => return Err(e.into()),
        }

        self.metrics.wallets_registered.inc();
        tracing::info!(
            wallet = %truncate_address(&wallet.address),
            chain_id = wallet.chain_id,
            signers = wallet.signer_count(),
            threshold = wallet.threshold,
            "wallet registered"
        );
        Ok(wallet)
    }

    async fn verify_against_contract(&self, wallet: &Wallet) -> Result<(), CoordinatorError> {
        let required = self
            .contract
            .signatures_required(wallet.address)
            .await
            .map_err(|e| self.upstream(e))?;
        if required != u64::from(wallet.threshold) {
            return Err(CoordinatorError::invalid(format!(
                "contract requires {required} signatures, registration says {}",
                wallet.threshold
            )));
        }
        for signer in &wallet.signers {
            let owner = self
                .contract
                .is_owner(wallet.address, *signer)
                .await
                .map_err(|e| self.upstream(e))?;
            if !owner {
                return Err(CoordinatorError::invalid(format!(
                    "{signer} is not an owner of the deployed contract"
                )));
            }
        }
        Ok(())
    }

    fn upstream(&self, e: cosign_contract::ContractError) -> CoordinatorError {
        self.metrics.upstream_errors.inc();
        CoordinatorError::UpstreamUnavailable(e.to_string())
    }

    pub fn wallet(&self, address: &Address) -> Result<Wallet, CoordinatorError> {
        load_wallet(&*self.store, address)
    }

    /// Every wallet that lists `signer` among its signers.
    pub fn wallets_for_signer(&self, signer: &Address) -> Result<Vec<Wallet>, CoordinatorError> {
        let mut wallets = self.store.wallets_with_signer(signer)?;
        wallets.sort_by_key(|w| (w.created_at, w.address));
        Ok(wallets)
    }
}

pub(crate) fn load_wallet<S: WalletStore + ?Sized>(
    store: &S,
    address: &Address,
) -> Result<Wallet, CoordinatorError> {
    match store.get_wallet(address) {
        Ok(wallet) => Ok(wallet),
        Err(StoreError::NotFound(_)) => Err(CoordinatorError::WalletNotFound(*address)),
        Err(e) => Err(e.into()),
    }
}
