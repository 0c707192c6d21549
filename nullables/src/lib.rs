//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators (clock, storage, contract, signing wallet) are
//! abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod contract;
pub mod signer;
pub mod store;

pub use clock::NullClock;
pub use contract::{NullContract, SubmissionOutcome, SubmissionRecord};
pub use signer::NullSigner;
pub use store::NullStore;
