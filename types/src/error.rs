//! Errors raised by wallet-state invariants and action application.

use alloy_primitives::Address;
use thiserror::Error;

/// A wallet state violates an invariant, or an action cannot be applied to it.
///
/// Application errors only occur when the stored wallet no longer matches the
/// state the action was validated against.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("signer set is empty")]
    EmptySignerSet,

    #[error("zero address cannot be a signer")]
    ZeroSigner,

    #[error("{0} appears more than once in the signer set")]
    DuplicateSigner(Address),

    #[error("{0} is already a signer")]
    AlreadySigner(Address),

    #[error("{0} is not a signer")]
    NotSigner(Address),

    #[error("threshold {threshold} is outside 1..={signers}")]
    ThresholdOutOfRange { threshold: u32, signers: usize },

    #[error("{0} already has an open stream")]
    StreamAlreadyOpen(Address),

    #[error("{0} has no open stream")]
    NoOpenStream(Address),

    #[error("nonce overflow")]
    NonceOverflow,
}
