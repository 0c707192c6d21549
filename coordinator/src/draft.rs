//! Editable drafts behind the wallet-creation and proposal forms.
//!
//! Drafts hold raw user input and derive what the form shows from it; they
//! only become typed values through [`WalletDraft::finish`] and
//! [`ProposalDraft::build`].

use crate::error::CoordinatorError;
use crate::wallet_state::WalletRegistration;
use cosign_types::{is_zero_address, Action, ActionKind, Address, TxHash, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Signer rows and threshold of a wallet being set up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDraft {
    pub chain_id: u64,
    rows: Vec<String>,
    threshold: u32,
}

impl WalletDraft {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            rows: Vec::new(),
            threshold: 1,
        }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn add_row(&mut self, value: impl Into<String>) {
        self.rows.push(value.into());
        self.clamp_threshold();
    }

    pub fn set_row(&mut self, index: usize, value: impl Into<String>) {
        if let Some(row) = self.rows.get_mut(index) {
            *row = value.into();
        }
        self.clamp_threshold();
    }

    pub fn remove_row(&mut self, index: usize) {
        if index < self.rows.len() {
            self.rows.remove(index);
        }
        self.clamp_threshold();
    }

    /// Add the connected account as a signer unless a row already holds it.
    pub fn include(&mut self, connected: Address) {
        if !self.valid_signers().contains(&connected) {
            self.add_row(connected.to_string());
        }
    }

    /// Rows that parse to distinct non-zero addresses, in row order.
    pub fn valid_signers(&self) -> Vec<Address> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|row| Address::from_str(row.trim()).ok())
            .filter(|a| !is_zero_address(a) && seen.insert(*a))
            .collect()
    }

    pub fn valid_signer_count(&self) -> usize {
        self.valid_signers().len()
    }

    /// Thresholds the form may offer: `1..=valid_signer_count`, or just `1`
    /// while no row is valid.
    pub fn threshold_options(&self) -> RangeInclusive<u32> {
        1..=(self.valid_signer_count() as u32).max(1)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: u32) -> Result<(), CoordinatorError> {
        if !self.threshold_options().contains(&threshold) {
            return Err(CoordinatorError::invalid(format!(
                "signatures required must be between 1 and {}",
                self.threshold_options().end()
            )));
        }
        self.threshold = threshold;
        Ok(())
    }

    fn clamp_threshold(&mut self) {
        let max = *self.threshold_options().end();
        self.threshold = self.threshold.clamp(1, max);
    }

    /// Validate every row and produce the registration for the deployed
    /// wallet at `address`.
    pub fn finish(
        &self,
        address: Address,
        deployment_tx: Option<TxHash>,
    ) -> Result<WalletRegistration, CoordinatorError> {
        let mut signers = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            let row = row.trim();
            if row.is_empty() {
                continue;
            }
            let signer = Address::from_str(row).map_err(|_| {
                CoordinatorError::invalid(format!("signer {} is not a valid address", i + 1))
            })?;
            if is_zero_address(&signer) {
                return Err(CoordinatorError::invalid("zero address cannot be a signer"));
            }
            if signers.contains(&signer) {
                return Err(CoordinatorError::invalid(format!("{signer} is listed twice")));
            }
            signers.push(signer);
        }
        if signers.is_empty() {
            return Err(CoordinatorError::invalid("at least one signer is required"));
        }
        if self.threshold == 0 || self.threshold as usize > signers.len() {
            return Err(CoordinatorError::invalid(format!(
                "signatures required must be between 1 and {}",
                signers.len()
            )));
        }
        Ok(WalletRegistration {
            address,
            chain_id: self.chain_id,
            signers,
            threshold: self.threshold,
            deployment_tx,
        })
    }
}

/// The action a signer is composing for one wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalDraft {
    pub wallet: Address,
    pub proposer: Address,
    pub kind: Option<ActionKind>,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub new_threshold: String,
}

impl ProposalDraft {
    pub fn open(wallet: Address, proposer: Address) -> Self {
        Self {
            wallet,
            proposer,
            kind: None,
            target: String::new(),
            amount: String::new(),
            frequency: String::new(),
            new_threshold: String::new(),
        }
    }

    /// Switch the selected action, keeping already typed parameters.
    pub fn select(&mut self, kind: ActionKind) {
        self.kind = Some(kind);
    }

    /// Reset every field but the wallet and proposer.
    pub fn clear(&mut self) {
        *self = Self::open(self.wallet, self.proposer);
    }

    /// Parse the raw fields into the typed action for the selected kind.
    pub fn build(&self) -> Result<Action, CoordinatorError> {
        let kind = self
            .kind
            .ok_or_else(|| CoordinatorError::invalid("no action selected"))?;
        let target = parse_address("address", &self.target)?;
        Ok(match kind {
            ActionKind::AddSigner => Action::AddSigner {
                signer: target,
                new_threshold: parse_threshold(&self.new_threshold)?,
            },
            ActionKind::RemoveSigner => Action::RemoveSigner {
                signer: target,
                new_threshold: parse_threshold(&self.new_threshold)?,
            },
            ActionKind::TransferFunds => Action::TransferFunds {
                to: target,
                amount: parse_amount("amount", &self.amount)?,
            },
            ActionKind::OpenStream => Action::OpenStream {
                to: target,
                amount: parse_amount("amount", &self.amount)?,
                frequency: parse_amount("frequency", &self.frequency)?,
            },
            ActionKind::CloseStream => Action::CloseStream { to: target },
        })
    }

    /// Consume the draft into `(wallet, action, proposer)` for submission.
    pub fn into_request(self) -> Result<(Address, Action, Address), CoordinatorError> {
        let action = self.build()?;
        Ok((self.wallet, action, self.proposer))
    }
}

fn parse_address(field: &str, raw: &str) -> Result<Address, CoordinatorError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CoordinatorError::invalid(format!("{field} is required")));
    }
    Address::from_str(raw)
        .map_err(|_| CoordinatorError::invalid(format!("{field} is not a valid address: {raw}")))
}

fn parse_threshold(raw: &str) -> Result<u32, CoordinatorError> {
    raw.trim().parse::<u32>().map_err(|_| {
        CoordinatorError::invalid(format!("signatures required must be a number, got {raw:?}"))
    })
}

/// Decimal or `0x` hex, in wei.
fn parse_amount(field: &str, raw: &str) -> Result<U256, CoordinatorError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CoordinatorError::invalid(format!("{field} is required")));
    }
    U256::from_str(raw)
        .map_err(|_| CoordinatorError::invalid(format!("{field} is not a valid amount: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    #[test]
    fn wallet_draft_derives_threshold_options() {
        let mut draft = WalletDraft::new(1);
        assert_eq!(draft.threshold_options(), 1..=1);

        draft.add_row(addr(1).to_string());
        draft.add_row(addr(2).to_string());
        draft.add_row("not an address");
        draft.add_row(addr(1).to_string());
        assert_eq!(draft.valid_signer_count(), 2);
        assert_eq!(draft.threshold_options(), 1..=2);

        draft.set_threshold(2).unwrap();
        assert!(draft.set_threshold(3).is_err());

        // Shrinking the rows clamps the threshold.
        draft.remove_row(1);
        assert_eq!(draft.threshold(), 1);
    }

    #[test]
    fn include_adds_connected_account_once() {
        let mut draft = WalletDraft::new(1);
        draft.include(addr(7));
        draft.include(addr(7));
        assert_eq!(draft.rows().len(), 1);
        assert_eq!(draft.valid_signers(), vec![addr(7)]);
    }

    #[test]
    fn finish_rejects_bad_rows() {
        let mut draft = WalletDraft::new(31337);
        draft.add_row(addr(1).to_string());
        draft.add_row("0x1234");
        assert!(draft.finish(addr(0xAA), None).is_err());

        draft.set_row(1, addr(2).to_string());
        draft.set_threshold(2).unwrap();
        let reg = draft.finish(addr(0xAA), None).unwrap();
        assert_eq!(reg.signers, vec![addr(1), addr(2)]);
        assert_eq!(reg.threshold, 2);
        assert_eq!(reg.chain_id, 31337);

        draft.set_row(1, addr(1).to_string());
        assert!(draft.finish(addr(0xAA), None).is_err());
    }

    #[test]
    fn proposal_draft_builds_typed_actions() {
        let mut draft = ProposalDraft::open(addr(0xAA), addr(1));
        assert!(draft.build().is_err());

        draft.select(ActionKind::OpenStream);
        draft.target = addr(2).to_string();
        draft.amount = "1000".into();
        draft.frequency = "0x3c".into();
        assert_eq!(
            draft.build().unwrap(),
            Action::OpenStream {
                to: addr(2),
                amount: U256::from(1000u64),
                frequency: U256::from(60u64),
            }
        );

        draft.select(ActionKind::AddSigner);
        draft.new_threshold = "two".into();
        assert!(draft.build().is_err());
        draft.new_threshold = "2".into();
        let (wallet, action, proposer) = draft.clone().into_request().unwrap();
        assert_eq!(wallet, addr(0xAA));
        assert_eq!(proposer, addr(1));
        assert_eq!(action.new_threshold(), Some(2));

        draft.clear();
        assert_eq!(draft, ProposalDraft::open(addr(0xAA), addr(1)));
    }
}
