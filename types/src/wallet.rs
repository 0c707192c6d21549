//! The wallet document: the off-chain mirror of one multisig contract.

use crate::action::Action;
use crate::error::StateError;
use crate::hash::TxHash;
use crate::time::Timestamp;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A multisig wallet as tracked off-chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Contract address, assigned at deployment.
    pub address: Address,
    pub chain_id: u64,
    /// Authorized signers, in registration order.
    pub signers: Vec<Address>,
    /// Signatures required to execute.
    pub threshold: u32,
    /// Replay-protection counter: the nonce the next execution must carry.
    pub nonce: u64,
    #[serde(default)]
    pub open_streams: Vec<Stream>,
    #[serde(default)]
    pub deployment_tx: Option<TxHash>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A recurring payment opened by an executed `openStream`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub recipient: Address,
    pub amount: U256,
    pub frequency: U256,
    /// Nonce of the execution that opened the stream.
    pub opened_at_nonce: u64,
}

impl Wallet {
    /// A freshly registered wallet at nonce 0.
    pub fn new(
        address: Address,
        chain_id: u64,
        signers: Vec<Address>,
        threshold: u32,
        deployment_tx: Option<TxHash>,
        now: Timestamp,
    ) -> Result<Self, StateError> {
        let wallet = Self {
            address,
            chain_id,
            signers,
            threshold,
            nonce: 0,
            open_streams: Vec::new(),
            deployment_tx,
            created_at: now,
            updated_at: now,
        };
        wallet.check_invariants()?;
        Ok(wallet)
    }

    pub fn is_signer(&self, address: &Address) -> bool {
        self.signers.contains(address)
    }

    pub fn signer_count(&self) -> usize {
        self.signers.len()
    }

    pub fn stream_for(&self, recipient: &Address) -> Option<&Stream> {
        self.open_streams.iter().find(|s| &s.recipient == recipient)
    }

    pub fn has_open_stream(&self, recipient: &Address) -> bool {
        self.stream_for(recipient).is_some()
    }

    /// Check the signer-set and threshold invariants.
    pub fn check_invariants(&self) -> Result<(), StateError> {
        if self.signers.is_empty() {
            return Err(StateError::EmptySignerSet);
        }
        let mut seen = HashSet::with_capacity(self.signers.len());
        for signer in &self.signers {
            if signer.is_zero() {
                return Err(StateError::ZeroSigner);
            }
            if !seen.insert(signer) {
                return Err(StateError::DuplicateSigner(*signer));
            }
        }
        if self.threshold == 0 || self.threshold as usize > self.signers.len() {
            return Err(StateError::ThresholdOutOfRange {
                threshold: self.threshold,
                signers: self.signers.len(),
            });
        }
        Ok(())
    }

    /// The wallet state after `action` executes on-chain: the action's effect
    /// applied and the nonce consumed.
    ///
    /// Returns the next state without touching `self`, so the caller can
    /// persist it in the same write as the transaction's terminal status.
    pub fn apply(&self, action: &Action, now: Timestamp) -> Result<Wallet, StateError> {
        let mut next = self.clone();
        match action {
            Action::AddSigner {
                signer,
                new_threshold,
            } => {
                if next.is_signer(signer) {
                    return Err(StateError::AlreadySigner(*signer));
                }
                next.signers.push(*signer);
                next.threshold = *new_threshold;
            }
            Action::RemoveSigner {
                signer,
                new_threshold,
            } => {
                if !next.is_signer(signer) {
                    return Err(StateError::NotSigner(*signer));
                }
                next.signers.retain(|s| s != signer);
                next.open_streams.retain(|s| &s.recipient != signer);
                next.threshold = *new_threshold;
            }
            Action::TransferFunds { .. } => {}
            Action::OpenStream {
                to,
                amount,
                frequency,
            } => {
                if next.has_open_stream(to) {
                    return Err(StateError::StreamAlreadyOpen(*to));
                }
                next.open_streams.push(Stream {
                    recipient: *to,
                    amount: *amount,
                    frequency: *frequency,
                    opened_at_nonce: self.nonce,
                });
            }
            Action::CloseStream { to } => {
                if !next.has_open_stream(to) {
                    return Err(StateError::NoOpenStream(*to));
                }
                next.open_streams.retain(|s| &s.recipient != to);
            }
        }
        next.nonce = self.nonce.checked_add(1).ok_or(StateError::NonceOverflow)?;
        next.updated_at = now;
        next.check_invariants()?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn wallet(signers: &[u8], threshold: u32) -> Wallet {
        Wallet::new(
            addr(0xAA),
            31337,
            signers.iter().map(|b| addr(*b)).collect(),
            threshold,
            None,
            Timestamp::new(100),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_bad_signer_sets() {
        let now = Timestamp::new(1);
        assert_eq!(
            Wallet::new(addr(0xAA), 1, vec![], 1, None, now).unwrap_err(),
            StateError::EmptySignerSet
        );
        assert_eq!(
            Wallet::new(addr(0xAA), 1, vec![Address::ZERO], 1, None, now).unwrap_err(),
            StateError::ZeroSigner
        );
        assert_eq!(
            Wallet::new(addr(0xAA), 1, vec![addr(1), addr(1)], 1, None, now).unwrap_err(),
            StateError::DuplicateSigner(addr(1))
        );
        assert!(matches!(
            Wallet::new(addr(0xAA), 1, vec![addr(1)], 2, None, now),
            Err(StateError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn add_signer_updates_set_threshold_and_nonce() {
        let mut w = wallet(&[1, 2, 3], 2);
        w.nonce = 5;
        let next = w
            .apply(
                &Action::AddSigner {
                    signer: addr(4),
                    new_threshold: 3,
                },
                Timestamp::new(200),
            )
            .unwrap();
        assert_eq!(next.signers, vec![addr(1), addr(2), addr(3), addr(4)]);
        assert_eq!(next.threshold, 3);
        assert_eq!(next.nonce, 6);
        assert_eq!(next.updated_at, Timestamp::new(200));
        // original untouched
        assert_eq!(w.nonce, 5);
    }

    #[test]
    fn remove_signer_closes_its_stream() {
        let w = wallet(&[1, 2, 3], 2);
        let w = w
            .apply(
                &Action::OpenStream {
                    to: addr(3),
                    amount: U256::from(10),
                    frequency: U256::from(60),
                },
                Timestamp::new(1),
            )
            .unwrap();
        assert!(w.has_open_stream(&addr(3)));
        let w = w
            .apply(
                &Action::RemoveSigner {
                    signer: addr(3),
                    new_threshold: 1,
                },
                Timestamp::new(2),
            )
            .unwrap();
        assert!(!w.is_signer(&addr(3)));
        assert!(!w.has_open_stream(&addr(3)));
        assert_eq!(w.nonce, 2);
    }

    #[test]
    fn remove_below_threshold_is_rejected() {
        let w = wallet(&[1, 2], 2);
        let err = w
            .apply(
                &Action::RemoveSigner {
                    signer: addr(2),
                    new_threshold: 2,
                },
                Timestamp::new(1),
            )
            .unwrap_err();
        assert!(matches!(err, StateError::ThresholdOutOfRange { .. }));
    }

    #[test]
    fn stream_toggles() {
        let w = wallet(&[1, 2], 1);
        let open = Action::OpenStream {
            to: addr(2),
            amount: U256::from(1),
            frequency: U256::from(1),
        };
        let w = w.apply(&open, Timestamp::new(1)).unwrap();
        assert_eq!(w.stream_for(&addr(2)).unwrap().opened_at_nonce, 0);
        assert_eq!(
            w.apply(&open, Timestamp::new(2)).unwrap_err(),
            StateError::StreamAlreadyOpen(addr(2))
        );
        let w = w
            .apply(&Action::CloseStream { to: addr(2) }, Timestamp::new(3))
            .unwrap();
        assert!(w.open_streams.is_empty());
        assert_eq!(w.nonce, 2);
    }

    #[test]
    fn transfer_only_consumes_nonce() {
        let w = wallet(&[1], 1);
        let next = w
            .apply(
                &Action::TransferFunds {
                    to: addr(9),
                    amount: U256::from(5),
                },
                Timestamp::new(1),
            )
            .unwrap();
        assert_eq!(next.signers, w.signers);
        assert_eq!(next.nonce, 1);
    }
}
