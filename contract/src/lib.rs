//! The on-chain side of cosign.
//!
//! The multisig contract and the signing wallet are external collaborators;
//! this crate describes them as traits ([`MultisigContract`],
//! [`MessageSigner`]), provides the Solidity ABI bindings used to encode
//! call data, and ships a JSON-RPC implementation of the contract trait.

pub mod bindings;
pub mod calldata;
pub mod error;
pub mod json_rpc;
pub mod traits;

pub use calldata::encode_action;
pub use error::ContractError;
pub use json_rpc::{JsonRpcContract, DEFAULT_TIMEOUT};
pub use traits::{MessageSigner, MultisigContract};
