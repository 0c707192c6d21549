use cosign_contract::ContractError;
use cosign_store::StoreError;
use cosign_types::{Address, TransactionId, TransactionStatus, TxHash};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid proposal: {reason}")]
    InvalidProposal { reason: String },

    #[error("{signer} is not an authorized signer of wallet {wallet}")]
    NotAuthorizedSigner { signer: Address, wallet: Address },

    #[error("{signer} has already signed transaction {id}")]
    AlreadySigned { signer: Address, id: TransactionId },

    #[error("transaction {id} cannot be signed in status {status}")]
    NotSignable {
        id: TransactionId,
        status: TransactionStatus,
    },

    #[error("transaction {id} is not ready to execute ({signatures}/{threshold} signatures, status {status})")]
    NotReady {
        id: TransactionId,
        status: TransactionStatus,
        signatures: usize,
        threshold: u32,
    },

    #[error("transaction nonce {transaction_nonce} does not match wallet nonce {wallet_nonce}")]
    Stale {
        transaction_nonce: u64,
        wallet_nonce: u64,
    },

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("execution reverted on-chain in {transaction_ref}")]
    ExecutionFailed { transaction_ref: TxHash },

    #[error("transaction {id} cannot be cancelled in status {status}")]
    NotCancellable {
        id: TransactionId,
        status: TransactionStatus,
    },

    #[error("wallet not found: {0}")]
    WalletNotFound(Address),

    #[error("wallet already registered: {0}")]
    AlreadyRegistered(Address),

    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("concurrent update conflict: {0}")]
    Conflict(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl CoordinatorError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidProposal {
            reason: reason.into(),
        }
    }

    /// Whether the same request may succeed if simply retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable(_) | Self::SubmissionRejected(_) | Self::Conflict(_)
        )
    }

    /// Stable machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidProposal { .. } => "invalidProposal",
            Self::NotAuthorizedSigner { .. } => "notAuthorizedSigner",
            Self::AlreadySigned { .. } => "alreadySigned",
            Self::NotSignable { .. } => "notSignable",
            Self::NotReady { .. } => "notReady",
            Self::Stale { .. } => "stale",
            Self::UpstreamUnavailable(_) => "upstreamUnavailable",
            Self::SubmissionRejected(_) => "submissionRejected",
            Self::ExecutionFailed { .. } => "executionFailed",
            Self::NotCancellable { .. } => "notCancellable",
            Self::WalletNotFound(_) => "walletNotFound",
            Self::AlreadyRegistered(_) => "alreadyRegistered",
            Self::TransactionNotFound(_) => "transactionNotFound",
            Self::Conflict(_) => "conflict",
            Self::Store(_) => "store",
        }
    }
}

impl From<StoreError> for CoordinatorError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Store(other),
        }
    }
}

impl From<ContractError> for CoordinatorError {
    fn from(e: ContractError) -> Self {
        match e {
            ContractError::Rejected(msg) => Self::SubmissionRejected(msg),
            ContractError::Unavailable(msg) | ContractError::Decode(msg) => {
                Self::UpstreamUnavailable(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_variants() {
        assert!(CoordinatorError::UpstreamUnavailable("x".into()).is_retryable());
        assert!(CoordinatorError::SubmissionRejected("x".into()).is_retryable());
        assert!(CoordinatorError::Conflict("x".into()).is_retryable());
        assert!(!CoordinatorError::Stale {
            transaction_nonce: 1,
            wallet_nonce: 2
        }
        .is_retryable());
        assert!(!CoordinatorError::invalid("bad").is_retryable());
        assert!(!CoordinatorError::ExecutionFailed {
            transaction_ref: TxHash::ZERO
        }
        .is_retryable());
    }

    #[test]
    fn store_conflict_becomes_conflict() {
        let e: CoordinatorError = StoreError::Conflict("v".into()).into();
        assert!(matches!(e, CoordinatorError::Conflict(_)));
        let e: CoordinatorError = StoreError::Backend("io".into()).into();
        assert_eq!(e.kind(), "store");
    }

    #[test]
    fn contract_errors_map_by_cause() {
        let e: CoordinatorError = ContractError::Rejected("nonce too low".into()).into();
        assert_eq!(e.kind(), "submissionRejected");
        let e: CoordinatorError = ContractError::Decode("junk".into()).into();
        assert_eq!(e.kind(), "upstreamUnavailable");
    }
}
