//! One handle over every coordinator component, shared by the HTTP layer.

use crate::config::CoordinatorConfig;
use crate::draft::ProposalDraft;
use crate::error::CoordinatorError;
use crate::execution::ExecutionCoordinator;
use crate::hash_builder::HashBuilder;
use crate::locks::WalletLocks;
use crate::metrics::CoordinatorMetrics;
use crate::proposal::{load_transaction, ProposalManager};
use crate::signature::SignatureCollector;
use crate::wallet_state::{WalletRegistration, WalletRegistry};
use cosign_contract::{MessageSigner, MultisigContract};
use cosign_store::{ExecutionStore, TransactionQuery};
use cosign_types::{Action, Address, Clock, Receipt, Signature, Transaction, TransactionId, Wallet};
use std::sync::Arc;

pub struct MultisigService<S, C> {
    store: Arc<S>,
    registry: WalletRegistry<S, C>,
    proposals: ProposalManager<S, C>,
    signatures: SignatureCollector<S>,
    execution: ExecutionCoordinator<S, C>,
    metrics: Arc<CoordinatorMetrics>,
}

impl<S, C> MultisigService<S, C>
where
    S: ExecutionStore,
    C: MultisigContract,
{
    pub fn new(
        store: Arc<S>,
        contract: Arc<C>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
    ) -> Self {
        Self::with_metrics(store, contract, clock, config, Arc::new(CoordinatorMetrics::new()))
    }

    pub fn with_metrics(
        store: Arc<S>,
        contract: Arc<C>,
        clock: Arc<dyn Clock>,
        config: CoordinatorConfig,
        metrics: Arc<CoordinatorMetrics>,
    ) -> Self {
        let registry = WalletRegistry::new(
            Arc::clone(&store),
            Arc::clone(&contract),
            Arc::clone(&clock),
            config.clone(),
            Arc::clone(&metrics),
        );
        let proposals = ProposalManager::new(
            Arc::clone(&store),
            HashBuilder::new(Arc::clone(&contract)),
            Arc::clone(&clock),
            config.clone(),
            Arc::clone(&metrics),
        );
        let signatures = SignatureCollector::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.clone(),
            Arc::clone(&metrics),
        );
        let execution = ExecutionCoordinator::new(
            Arc::clone(&store),
            contract,
            clock,
            config,
            Arc::clone(&metrics),
            Arc::new(WalletLocks::new()),
        );
        Self {
            store,
            registry,
            proposals,
            signatures,
            execution,
            metrics,
        }
    }

    pub fn metrics(&self) -> &CoordinatorMetrics {
        &self.metrics
    }

    // ── Wallets ─────────────────────────────────────────────────────────

    pub async fn register_wallet(
        &self,
        registration: WalletRegistration,
    ) -> Result<Wallet, CoordinatorError> {
        self.registry.register_wallet(registration).await
    }

    pub fn wallet(&self, address: &Address) -> Result<Wallet, CoordinatorError> {
        self.registry.wallet(address)
    }

    pub fn wallets_for_signer(&self, signer: &Address) -> Result<Vec<Wallet>, CoordinatorError> {
        self.registry.wallets_for_signer(signer)
    }

    // ── Proposals ───────────────────────────────────────────────────────

    pub async fn propose(
        &self,
        wallet: Address,
        action: Action,
        proposer: Address,
    ) -> Result<Transaction, CoordinatorError> {
        self.proposals.propose(wallet, action, proposer).await
    }

    /// Build and submit a draft; the draft is consumed either way.
    pub async fn submit_draft(&self, draft: ProposalDraft) -> Result<Transaction, CoordinatorError> {
        let (wallet, action, proposer) = draft.into_request()?;
        self.propose(wallet, action, proposer).await
    }

    pub fn cancel(
        &self,
        id: TransactionId,
        requester: Address,
    ) -> Result<Transaction, CoordinatorError> {
        self.proposals.cancel(id, requester)
    }

    // ── Signatures ──────────────────────────────────────────────────────

    pub fn sign(
        &self,
        id: TransactionId,
        signer: Address,
        signature: Signature,
    ) -> Result<Transaction, CoordinatorError> {
        self.signatures.sign(id, signer, signature)
    }

    pub async fn sign_with<M: MessageSigner>(
        &self,
        id: TransactionId,
        signer: &M,
    ) -> Result<Transaction, CoordinatorError> {
        self.signatures.sign_with(id, signer).await
    }

    // ── Execution ───────────────────────────────────────────────────────

    pub async fn execute(
        &self,
        id: TransactionId,
        submitter: Address,
    ) -> Result<Receipt, CoordinatorError> {
        self.execution.execute(id, submitter).await
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn transaction(&self, id: TransactionId) -> Result<Transaction, CoordinatorError> {
        load_transaction(&*self.store, id)
    }

    /// Transactions of `wallet` matching `filter`; the filter's own wallet
    /// field is overridden.
    pub fn transactions(
        &self,
        wallet: Address,
        filter: TransactionQuery,
    ) -> Result<Vec<Transaction>, CoordinatorError> {
        self.registry.wallet(&wallet)?;
        let query = TransactionQuery {
            wallet: Some(wallet),
            ..filter
        };
        Ok(self.store.query_transactions(&query)?)
    }
}
