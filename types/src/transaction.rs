//! The transaction (proposal) document and its status machine.

use crate::action::{Action, ContractCall};
use crate::hash::TxHash;
use crate::signature::Signature;
use crate::time::Timestamp;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned identifier of a transaction document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl TransactionId {
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a proposal.
///
/// `Proposed → Pending → ReadyToExecute → Executed`, with `Failed` and
/// `Cancelled` as terminal alternatives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionStatus {
    /// Created, no signatures yet.
    Proposed,
    /// At least one signature, below threshold.
    Pending,
    /// Threshold met; can be submitted.
    ReadyToExecute,
    /// Executed on-chain with a success receipt.
    Executed,
    /// Executed on-chain but reverted.
    Failed,
    /// Superseded or withdrawn before execution.
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Failed | Self::Cancelled)
    }

    /// Whether signatures may still be appended.
    pub fn is_signable(&self) -> bool {
        matches!(self, Self::Proposed | Self::Pending)
    }

    /// Status after a signature append leaves `signer_count` signatures
    /// against a wallet requiring `threshold`.
    pub fn after_signature(signer_count: usize, threshold: u32) -> Self {
        if signer_count >= threshold as usize {
            Self::ReadyToExecute
        } else {
            Self::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Pending => "pending",
            Self::ReadyToExecute => "readyToExecute",
            Self::Executed => "executed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proposed" => Ok(Self::Proposed),
            "pending" => Ok(Self::Pending),
            "readyToExecute" => Ok(Self::ReadyToExecute),
            "executed" => Ok(Self::Executed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown transaction status: {other}")),
        }
    }
}

/// One collected signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerEntry {
    pub address: Address,
    pub signature: Signature,
}

/// Outcome of an on-chain submission, as reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_ref: TxHash,
    pub block_number: u64,
    pub block_hash: TxHash,
    pub success: bool,
}

/// Receipt reference persisted on a transaction once a receipt is observed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub transaction_ref: TxHash,
    pub block_number: u64,
    pub block_hash: TxHash,
    pub submitted_by: Address,
    pub observed_at: Timestamp,
}

/// A proposed wallet action and the signatures collected for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub wallet_address: Address,
    /// Wallet nonce at proposal time; the replay slot this proposal occupies.
    pub nonce: u64,
    #[serde(flatten)]
    pub action: Action,
    pub call: ContractCall,
    /// Hash every signature must be produced over. Never changes.
    pub signature_required_hash: TxHash,
    pub signers: Vec<SignerEntry>,
    pub status: TransactionStatus,
    pub proposed_by: Address,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Optimistic-concurrency token; bumped by the store on every write.
    #[serde(default)]
    pub version: u64,
    /// Last submission still awaiting a receipt.
    #[serde(default)]
    pub pending_submission: Option<TxHash>,
    #[serde(default)]
    pub execution: Option<ExecutionRecord>,
}

impl Transaction {
    pub fn has_signed(&self, address: &Address) -> bool {
        self.signers.iter().any(|s| &s.address == address)
    }

    pub fn signer_count(&self) -> usize {
        self.signers.len()
    }

    /// Signatures ordered by signer address ascending, the order the
    /// contract's recovery loop requires.
    pub fn ordered_signatures(&self) -> Vec<Signature> {
        let mut entries: Vec<&SignerEntry> = self.signers.iter().collect();
        entries.sort_by_key(|e| e.address);
        entries.into_iter().map(|e| e.signature.clone()).collect()
    }
}
