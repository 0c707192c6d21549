//! LMDB storage backend for cosign.
//!
//! Implements the storage traits from `cosign-store` using the `heed` LMDB
//! bindings. Wallet and transaction documents are stored as JSON values in
//! one environment; every multi-document write happens inside a single
//! LMDB write transaction, which LMDB serializes across writers.

pub mod environment;
pub mod error;
pub mod execution;
pub mod meta;
pub mod transaction;
pub mod wallet;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
