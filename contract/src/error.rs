use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Transport failure or provider outage. Safe to retry.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider refused the submission (revert on estimate, bad nonce, ...).
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("failed to decode provider response: {0}")]
    Decode(String),
}
