//! Transaction hash type.

/// A 32-byte hash: the signature-required hash produced by the wallet
/// contract, or the reference of an on-chain transaction.
pub type TxHash = alloy_primitives::B256;
