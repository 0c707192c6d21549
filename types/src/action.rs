//! The actions a proposal can carry.
//!
//! Each variant carries exactly the parameters its call needs, so a proposal
//! can never pair an action with the wrong arguments.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An action to be executed by the wallet contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// Add `signer` and set the threshold to `new_threshold`.
    AddSigner { signer: Address, new_threshold: u32 },
    /// Remove `signer` and set the threshold to `new_threshold`.
    RemoveSigner { signer: Address, new_threshold: u32 },
    /// Send `amount` wei from the wallet to `to`.
    TransferFunds { to: Address, amount: U256 },
    /// Open a recurring payment of `amount` every `frequency` seconds to `to`.
    OpenStream {
        to: Address,
        amount: U256,
        frequency: U256,
    },
    /// Close the open stream paying `to`.
    CloseStream { to: Address },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::AddSigner { .. } => ActionKind::AddSigner,
            Self::RemoveSigner { .. } => ActionKind::RemoveSigner,
            Self::TransferFunds { .. } => ActionKind::TransferFunds,
            Self::OpenStream { .. } => ActionKind::OpenStream,
            Self::CloseStream { .. } => ActionKind::CloseStream,
        }
    }

    /// The address the action is about (new/old signer, payee, stream recipient).
    pub fn target(&self) -> Address {
        match self {
            Self::AddSigner { signer, .. } | Self::RemoveSigner { signer, .. } => *signer,
            Self::TransferFunds { to, .. }
            | Self::OpenStream { to, .. }
            | Self::CloseStream { to } => *to,
        }
    }

    /// The threshold the wallet will have after execution, for signer changes.
    pub fn new_threshold(&self) -> Option<u32> {
        match self {
            Self::AddSigner { new_threshold, .. } | Self::RemoveSigner { new_threshold, .. } => {
                Some(*new_threshold)
            }
            _ => None,
        }
    }
}

/// The name of an action, without its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    AddSigner,
    RemoveSigner,
    TransferFunds,
    OpenStream,
    CloseStream,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        Self::AddSigner,
        Self::RemoveSigner,
        Self::TransferFunds,
        Self::OpenStream,
        Self::CloseStream,
    ];

    /// The contract method name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddSigner => "addSigner",
            Self::RemoveSigner => "removeSigner",
            Self::TransferFunds => "transferFunds",
            Self::OpenStream => "openStream",
            Self::CloseStream => "closeStream",
        }
    }

    /// Whether this action changes the signer set.
    pub fn changes_signers(&self) -> bool {
        matches!(self, Self::AddSigner | Self::RemoveSigner)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unsupported action: {s}"))
    }
}

/// The `(to, value, data)` triple a proposal binds its signatures to and
/// that execution submits verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}
