//! Pure encoding of a wallet [`Action`] into the call the wallet executes.

use crate::bindings::{addSignerCall, closeStreamCall, openStreamCall, removeSignerCall};
use alloy_sol_types::SolCall;
use cosign_types::{Action, Address, Bytes, ContractCall, U256};

/// Encode `action` against the wallet at `wallet`.
///
/// Signer and stream management are self-calls with zero value; a fund
/// transfer is a plain value transfer to the destination with empty data.
pub fn encode_action(wallet: Address, action: &Action) -> ContractCall {
    let data: Vec<u8> = match action {
        Action::AddSigner {
            signer,
            new_threshold,
        } => addSignerCall {
            newSigner: *signer,
            newSignaturesRequired: U256::from(*new_threshold),
        }
        .abi_encode(),
        Action::RemoveSigner {
            signer,
            new_threshold,
        } => removeSignerCall {
            oldSigner: *signer,
            newSignaturesRequired: U256::from(*new_threshold),
        }
        .abi_encode(),
        Action::OpenStream {
            to,
            amount,
            frequency,
        } => openStreamCall {
            to: *to,
            amount: *amount,
            frequency: *frequency,
        }
        .abi_encode(),
        Action::CloseStream { to } => closeStreamCall { to: *to }.abi_encode(),
        Action::TransferFunds { to, amount } => {
            return ContractCall {
                to: *to,
                value: *amount,
                data: Bytes::new(),
            }
        }
    };

    ContractCall {
        to: wallet,
        value: U256::ZERO,
        data: Bytes::from(data),
    }
}
