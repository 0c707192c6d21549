use proptest::prelude::*;

use cosign_coordinator::validate_action;
use cosign_types::{Action, Address, Timestamp, Wallet, U256};

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

fn action_strategy() -> impl Strategy<Value = Action> {
    let target = (0u8..12).prop_map(Address::repeat_byte);
    prop_oneof![
        (target.clone(), 0u32..14).prop_map(|(signer, new_threshold)| Action::AddSigner {
            signer,
            new_threshold
        }),
        (target.clone(), 0u32..14).prop_map(|(signer, new_threshold)| Action::RemoveSigner {
            signer,
            new_threshold
        }),
        (target.clone(), 0u64..3, 0u64..3).prop_map(|(to, a, f)| Action::OpenStream {
            to,
            amount: U256::from(a),
            frequency: U256::from(f),
        }),
        target.clone().prop_map(|to| Action::CloseStream { to }),
        (target, any::<u64>()).prop_map(|(to, a)| Action::TransferFunds {
            to,
            amount: U256::from(a),
        }),
    ]
}

proptest! {
    /// Whatever passes proposal validation can be applied at execution time
    /// and leaves a wallet that satisfies every invariant.
    #[test]
    fn validated_actions_always_apply(
        count in 1u8..10,
        t in 1u32..10,
        proposer in 1u8..10,
        action in action_strategy(),
    ) {
        let wallet = wallet_from(count, t.min(count as u32));
        let proposer = Address::repeat_byte(proposer);
        if validate_action(&wallet, &action, proposer).is_ok() {
            let next = wallet.apply(&action, Timestamp::new(1));
            prop_assert!(next.is_ok(), "{:?} failed to apply: {:?}", action, next);
            let next = next.unwrap();
            prop_assert!(next.check_invariants().is_ok());
            prop_assert_eq!(next.nonce, wallet.nonce + 1);
        }
    }

    /// Only current signers may propose anything.
    #[test]
    fn outsiders_never_pass(count in 1u8..10, action in action_strategy()) {
        let wallet = wallet_from(count, 1);
        let outsider = Address::repeat_byte(0xF7);
        prop_assert!(validate_action(&wallet, &action, outsider).is_err());
    }
}
