//! Off-chain coordination of multisig wallet transactions.
//!
//! A proposal moves through `proposed → pending → readyToExecute →
//! executed` (or `failed` / `cancelled`):
//!
//! - [`ProposalManager`] validates an action against the wallet, encodes its
//!   call data, asks the contract for the signature-required hash and
//!   persists the proposal, superseding same-nonce siblings.
//! - [`SignatureCollector`] appends signatures from authorized signers under
//!   optimistic concurrency.
//! - [`ExecutionCoordinator`] submits a fully signed proposal, waits for the
//!   receipt and advances the wallet in one atomic store write.
//! - [`WalletRegistry`] registers deployed wallets and answers wallet reads.
//!
//! [`MultisigService`] bundles all of them behind one handle.

pub mod config;
pub mod draft;
pub mod error;
pub mod execution;
pub mod hash_builder;
pub mod locks;
pub mod metrics;
pub mod proposal;
mod retry;
pub mod service;
pub mod signature;
pub mod wallet_state;

pub use config::CoordinatorConfig;
pub use draft::{ProposalDraft, WalletDraft};
pub use error::CoordinatorError;
pub use execution::ExecutionCoordinator;
pub use hash_builder::HashBuilder;
pub use locks::WalletLocks;
pub use metrics::CoordinatorMetrics;
pub use proposal::{validate_action, ProposalManager};
pub use service::MultisigService;
pub use signature::{is_ready_to_execute, SignatureCollector};
pub use wallet_state::{WalletRegistration, WalletRegistry};
