//! Abstract storage traits for cosign.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod error;
pub mod execution;
pub mod query;
pub mod transaction;
pub mod wallet;

pub use error::StoreError;
pub use execution::ExecutionStore;
pub use query::{SortOrder, TransactionQuery};
pub use transaction::{NewTransaction, TransactionStore};
pub use wallet::WalletStore;
