//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cosign_coordinator::CoordinatorError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error("server error: {0}")]
    Server(String),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    pub retryable: bool,
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Coordinator(e) => match e {
                CoordinatorError::InvalidProposal { .. } => StatusCode::BAD_REQUEST,
                CoordinatorError::NotAuthorizedSigner { .. } => StatusCode::FORBIDDEN,
                CoordinatorError::WalletNotFound(_) | CoordinatorError::TransactionNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CoordinatorError::AlreadySigned { .. }
                | CoordinatorError::NotSignable { .. }
                | CoordinatorError::NotReady { .. }
                | CoordinatorError::Stale { .. }
                | CoordinatorError::NotCancellable { .. }
                | CoordinatorError::AlreadyRegistered(_)
                | CoordinatorError::Conflict(_) => StatusCode::CONFLICT,
                CoordinatorError::ExecutionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                CoordinatorError::SubmissionRejected(_) => StatusCode::BAD_GATEWAY,
                CoordinatorError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                CoordinatorError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalidRequest",
            Self::Server(_) => "server",
            Self::Coordinator(e) => e.kind(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Coordinator(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{self}");
        } else {
            tracing::debug!(kind = self.kind(), "{self}");
        }
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
            retryable: self.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosign_types::{Address, TransactionId, TransactionStatus};

    #[test]
    fn coordinator_errors_map_to_statuses() {
        let cases = [
            (CoordinatorError::invalid("bad"), StatusCode::BAD_REQUEST),
            (
                CoordinatorError::NotAuthorizedSigner {
                    signer: Address::ZERO,
                    wallet: Address::ZERO,
                },
                StatusCode::FORBIDDEN,
            ),
            (
                CoordinatorError::TransactionNotFound(TransactionId(9)),
                StatusCode::NOT_FOUND,
            ),
            (
                CoordinatorError::NotSignable {
                    id: TransactionId(1),
                    status: TransactionStatus::Executed,
                },
                StatusCode::CONFLICT,
            ),
            (
                CoordinatorError::Stale {
                    transaction_nonce: 1,
                    wallet_nonce: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                CoordinatorError::UpstreamUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(RpcError::from(err).status(), status);
        }
    }

    #[test]
    fn retryable_follows_coordinator() {
        assert!(RpcError::from(CoordinatorError::Conflict("x".into())).is_retryable());
        assert!(!RpcError::InvalidRequest("x".into()).is_retryable());
        assert_eq!(
            RpcError::from(CoordinatorError::WalletNotFound(Address::ZERO)).kind(),
            "walletNotFound"
        );
    }
}
