//! Nullable signer: a fake wallet account that signs deterministically.

use alloy_primitives::keccak256;
use cosign_contract::{ContractError, MessageSigner};
use cosign_types::{Address, Signature, TxHash};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Signs with a stand-in 65-byte `r ‖ s ‖ v` layout derived from the
/// account and the hash, so signatures differ per signer and per hash.
pub struct NullSigner {
    address: Address,
    refuse: AtomicBool,
    signed: AtomicUsize,
}

impl NullSigner {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            refuse: AtomicBool::new(false),
            signed: AtomicUsize::new(0),
        }
    }

    /// Make subsequent `sign_message` calls fail, as when the user rejects
    /// the prompt in their wallet.
    pub fn refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Number of signatures produced so far.
    pub fn signed_count(&self) -> usize {
        self.signed.load(Ordering::SeqCst)
    }

    /// The signature this signer produces for `hash`.
    pub fn signature_for(address: Address, hash: &TxHash) -> Signature {
        let r = keccak256([address.as_slice(), hash.as_slice()].concat());
        let s = keccak256([hash.as_slice(), address.as_slice()].concat());
        let mut bytes = Vec::with_capacity(65);
        bytes.extend_from_slice(r.as_slice());
        bytes.extend_from_slice(s.as_slice());
        bytes.push(27);
        Signature::from(bytes)
    }
}

impl MessageSigner for NullSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_message(&self, hash: &TxHash) -> Result<Signature, ContractError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ContractError::Rejected("user rejected the request".into()));
        }
        self.signed.fetch_add(1, Ordering::SeqCst);
        Ok(Self::signature_for(self.address, hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signatures_are_deterministic_and_distinct() {
        let hash = TxHash::repeat_byte(0x42);
        let a = NullSigner::new(Address::repeat_byte(1));
        let b = NullSigner::new(Address::repeat_byte(2));

        let sig_a = a.sign_message(&hash).await.unwrap();
        assert_eq!(sig_a, a.sign_message(&hash).await.unwrap());
        assert_ne!(sig_a, b.sign_message(&hash).await.unwrap());
        assert_eq!(sig_a.as_bytes().len(), 65);
        assert_eq!(a.signed_count(), 2);
    }

    #[tokio::test]
    async fn refusal_is_reported() {
        let a = NullSigner::new(Address::repeat_byte(1));
        a.refuse(true);
        assert!(a.sign_message(&TxHash::ZERO).await.is_err());
        assert_eq!(a.signed_count(), 0);
    }
}
