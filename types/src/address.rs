//! Ethereum account addresses.

pub use alloy_primitives::Address;

/// Whether `address` is the all-zero address, which can never be a signer
/// or a transfer destination.
pub fn is_zero_address(address: &Address) -> bool {
    address.is_zero()
}
