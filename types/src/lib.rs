//! Fundamental types for the cosign multisig coordinator.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, hashes, signatures, timestamps, the wallet and transaction
//! documents, the action variants a proposal can carry, and the transaction
//! status machine.

pub mod action;
pub mod address;
pub mod error;
pub mod hash;
pub mod signature;
pub mod time;
pub mod transaction;
pub mod wallet;

pub use action::{Action, ActionKind, ContractCall};
pub use address::{is_zero_address, Address};
pub use alloy_primitives::{Bytes, U256};
pub use error::StateError;
pub use hash::TxHash;
pub use signature::Signature;
pub use time::{Clock, SystemClock, Timestamp};
pub use transaction::{
    ExecutionRecord, Receipt, SignerEntry, Transaction, TransactionId, TransactionStatus,
};
pub use wallet::{Stream, Wallet};
