use proptest::prelude::*;

use cosign_types::{Action, Address, Timestamp, TransactionStatus, Wallet, U256};

fn wallet_from(count: u8, threshold: u32) -> Wallet {
    let signers = (1..=count).map(Address::repeat_byte).collect();
    Wallet::new(
        Address::repeat_byte(0xEE),
        1,
        signers,
        threshold,
        None,
        Timestamp::new(0),
    )
    .unwrap()
}

proptest! {
    /// Adding a signer with any threshold in 1..=n+1 yields a valid wallet one nonce later.
    #[test]
    fn add_signer_keeps_invariants(count in 1u8..10, t in 1u32..12, new_t in 1u32..12) {
        let threshold = t.min(count as u32);
        let wallet = wallet_from(count, threshold);
        let action = Action::AddSigner { signer: Address::repeat_byte(0xF0), new_threshold: new_t };
        match wallet.apply(&action, Timestamp::new(1)) {
            Ok(next) => {
                prop_assert!(new_t as usize <= count as usize + 1);
                prop_assert_eq!(next.signers.len(), count as usize + 1);
                prop_assert_eq!(next.nonce, wallet.nonce + 1);
                prop_assert!(next.check_invariants().is_ok());
            }
            Err(_) => prop_assert!(new_t as usize > count as usize + 1),
        }
    }

    /// Removing a signer never leaves threshold above the remaining signer count.
    #[test]
    fn remove_signer_keeps_invariants(count in 1u8..10, victim in 1u8..10, new_t in 0u32..12) {
        let wallet = wallet_from(count, 1);
        let action = Action::RemoveSigner { signer: Address::repeat_byte(victim), new_threshold: new_t };
        if let Ok(next) = wallet.apply(&action, Timestamp::new(1)) {
            prop_assert!(next.threshold >= 1);
            prop_assert!(next.threshold as usize <= next.signers.len());
            prop_assert!(!next.is_signer(&Address::repeat_byte(victim)));
        }
    }

    /// Transfers never touch the signer set or threshold.
    #[test]
    fn transfer_preserves_signers(count in 1u8..10, amount in any::<u64>()) {
        let wallet = wallet_from(count, 1);
        let action = Action::TransferFunds { to: Address::repeat_byte(0x99), amount: U256::from(amount) };
        let next = wallet.apply(&action, Timestamp::new(1)).unwrap();
        prop_assert_eq!(next.signers, wallet.signers);
        prop_assert_eq!(next.threshold, wallet.threshold);
    }

    /// A signature append reaches ReadyToExecute exactly when the threshold is met.
    #[test]
    fn status_after_signature_matches_threshold(count in 0usize..20, threshold in 1u32..20) {
        let status = TransactionStatus::after_signature(count, threshold);
        prop_assert_eq!(status == TransactionStatus::ReadyToExecute, count >= threshold as usize);
        prop_assert!(!status.is_terminal());
    }
}
