//! HTTP API for the multisig coordinator.
//!
//! Provides endpoints for:
//! - Wallet registration and lookup (by address or by signer)
//! - Proposal creation and transaction listing
//! - Signature submission, execution and cancellation
//! - Prometheus metrics and a health check

pub mod error;
pub mod handlers;
pub mod pagination;
pub mod server;

pub use error::RpcError;
pub use server::{router, RpcConfig, RpcServer};
