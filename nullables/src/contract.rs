//! Nullable contract: an in-memory multisig wallet contract.
//!
//! Mirrors the deployed contract closely enough for the coordinator:
//! `getTransactionHash` is `keccak256(abi.encodePacked(wallet, chainId,
//! nonce, to, value, data))`, a successful execution consumes the on-chain
//! nonce, and receipts can be withheld to simulate a slow chain. Submissions
//! can also be parked in a mempool, unmined, until [`NullContract::mine`].

use alloy_primitives::keccak256;
use cosign_contract::{ContractError, MultisigContract};
use cosign_types::{Address, ContractCall, Receipt, Signature, TxHash, Wallet, U256};
use std::collections::HashMap;
use std::sync::Mutex;

/// What the next submissions do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SubmissionOutcome {
    /// Mined with a success receipt.
    #[default]
    Success,
    /// Mined but reverted.
    Revert,
    /// Refused by the provider before broadcast.
    Reject,
    /// Provider unreachable.
    Unavailable,
}

/// One call to `submit_execution`, as observed by the contract.
#[derive(Clone, Debug)]
pub struct SubmissionRecord {
    pub wallet: Address,
    pub call: ContractCall,
    pub signatures: Vec<Signature>,
    pub submitter: Address,
    pub transaction_ref: TxHash,
}

/// A broadcast submission not yet included in a block.
struct Queued {
    wallet: Address,
    nonce: u64,
    transaction_ref: TxHash,
    success: bool,
}

#[derive(Clone)]
struct Deployed {
    chain_id: u64,
    nonce: u64,
    owners: Vec<Address>,
    signatures_required: u64,
}

#[derive(Default)]
struct ChainState {
    wallets: HashMap<Address, Deployed>,
    outcome: SubmissionOutcome,
    reads_unavailable: bool,
    withhold_receipts: bool,
    receipts: HashMap<TxHash, Receipt>,
    withheld: Vec<Receipt>,
    hold_in_mempool: bool,
    mempool: Vec<Queued>,
    submissions: Vec<SubmissionRecord>,
    block_number: u64,
}

pub struct NullContract {
    state: Mutex<ChainState>,
}

impl NullContract {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState {
                block_number: 1,
                ..ChainState::default()
            }),
        }
    }

    /// Deploy a contract matching `wallet`'s chain id, signers, threshold
    /// and nonce.
    pub fn deploy(&self, wallet: &Wallet) {
        self.state.lock().unwrap().wallets.insert(
            wallet.address,
            Deployed {
                chain_id: wallet.chain_id,
                nonce: wallet.nonce,
                owners: wallet.signers.clone(),
                signatures_required: u64::from(wallet.threshold),
            },
        );
    }

    pub fn set_outcome(&self, outcome: SubmissionOutcome) {
        self.state.lock().unwrap().outcome = outcome;
    }

    /// Make every read (`eth_call`) fail with `Unavailable`.
    pub fn set_reads_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().reads_unavailable = unavailable;
    }

    /// Hold receipts back until [`NullContract::release_receipts`].
    pub fn withhold_receipts(&self, withhold: bool) {
        self.state.lock().unwrap().withhold_receipts = withhold;
    }

    /// Publish every withheld receipt.
    pub fn release_receipts(&self) {
        let mut state = self.state.lock().unwrap();
        let withheld = std::mem::take(&mut state.withheld);
        for receipt in withheld {
            state.receipts.insert(receipt.transaction_ref, receipt);
        }
    }

    /// Accept submissions without mining them: no nonce change and no
    /// receipt until [`NullContract::mine`].
    pub fn hold_in_mempool(&self, hold: bool) {
        self.state.lock().unwrap().hold_in_mempool = hold;
    }

    /// Mine the mempool in submission order. A queued call whose nonce was
    /// already consumed reverts.
    pub fn mine(&self) {
        let mut state = self.state.lock().unwrap();
        let queued = std::mem::take(&mut state.mempool);
        for q in queued {
            let success = match state.wallets.get_mut(&q.wallet) {
                Some(d) if q.success && d.nonce == q.nonce => {
                    d.nonce += 1;
                    true
                }
                _ => false,
            };
            state.block_number += 1;
            let receipt = Receipt {
                transaction_ref: q.transaction_ref,
                block_number: state.block_number,
                block_hash: keccak256(state.block_number.to_be_bytes()),
                success,
            };
            state.receipts.insert(q.transaction_ref, receipt);
        }
    }

    pub fn mempool_len(&self) -> usize {
        self.state.lock().unwrap().mempool.len()
    }

    /// Move the on-chain nonce, as if some other client executed.
    pub fn set_nonce(&self, wallet: Address, nonce: u64) {
        if let Some(deployed) = self.state.lock().unwrap().wallets.get_mut(&wallet) {
            deployed.nonce = nonce;
        }
    }

    pub fn onchain_nonce(&self, wallet: Address) -> Option<u64> {
        self.state
            .lock()
            .unwrap()
            .wallets
            .get(&wallet)
            .map(|d| d.nonce)
    }

    pub fn submissions(&self) -> Vec<SubmissionRecord> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn submission_count(&self) -> usize {
        self.state.lock().unwrap().submissions.len()
    }

    /// The hash the deployed contract would compute.
    pub fn compute_hash(wallet: Address, chain_id: u64, nonce: u64, call: &ContractCall) -> TxHash {
        let mut packed = Vec::with_capacity(20 + 32 + 32 + 20 + 32 + call.data.len());
        packed.extend_from_slice(wallet.as_slice());
        packed.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
        packed.extend_from_slice(&U256::from(nonce).to_be_bytes::<32>());
        packed.extend_from_slice(call.to.as_slice());
        packed.extend_from_slice(&call.value.to_be_bytes::<32>());
        packed.extend_from_slice(&call.data);
        keccak256(packed)
    }

    fn deployed(state: &ChainState, wallet: Address) -> Result<Deployed, ContractError> {
        if state.reads_unavailable {
            return Err(ContractError::Unavailable("provider offline".into()));
        }
        state
            .wallets
            .get(&wallet)
            .cloned()
            .ok_or_else(|| ContractError::Unavailable(format!("no contract at {wallet}")))
    }
}

impl Default for NullContract {
    fn default() -> Self {
        Self::new()
    }
}

impl MultisigContract for NullContract {
    async fn transaction_hash(
        &self,
        wallet: Address,
        nonce: u64,
        call: &ContractCall,
    ) -> Result<TxHash, ContractError> {
        let state = self.state.lock().unwrap();
        let deployed = Self::deployed(&state, wallet)?;
        Ok(Self::compute_hash(wallet, deployed.chain_id, nonce, call))
    }

    async fn is_owner(&self, wallet: Address, account: Address) -> Result<bool, ContractError> {
        let state = self.state.lock().unwrap();
        Ok(Self::deployed(&state, wallet)?.owners.contains(&account))
    }

    async fn nonce(&self, wallet: Address) -> Result<u64, ContractError> {
        let state = self.state.lock().unwrap();
        Ok(Self::deployed(&state, wallet)?.nonce)
    }

    async fn signatures_required(&self, wallet: Address) -> Result<u64, ContractError> {
        let state = self.state.lock().unwrap();
        Ok(Self::deployed(&state, wallet)?.signatures_required)
    }

    async fn submit_execution(
        &self,
        wallet: Address,
        call: &ContractCall,
        signatures: &[Signature],
        submitter: Address,
    ) -> Result<TxHash, ContractError> {
        let mut state = self.state.lock().unwrap();
        match state.outcome {
            SubmissionOutcome::Unavailable => {
                return Err(ContractError::Unavailable("provider offline".into()))
            }
            SubmissionOutcome::Reject => {
                return Err(ContractError::Rejected("insufficient funds for gas".into()))
            }
            SubmissionOutcome::Success | SubmissionOutcome::Revert => {}
        }
        let deployed = Self::deployed(&state, wallet)?;

        let sequence = state.submissions.len() as u64;
        let mut seed = wallet.as_slice().to_vec();
        seed.extend_from_slice(&deployed.nonce.to_be_bytes());
        seed.extend_from_slice(&sequence.to_be_bytes());
        let transaction_ref = keccak256(seed);

        let success = state.outcome == SubmissionOutcome::Success;
        state.submissions.push(SubmissionRecord {
            wallet,
            call: call.clone(),
            signatures: signatures.to_vec(),
            submitter,
            transaction_ref,
        });
        if state.hold_in_mempool {
            state.mempool.push(Queued {
                wallet,
                nonce: deployed.nonce,
                transaction_ref,
                success,
            });
            return Ok(transaction_ref);
        }
        if success {
            if let Some(d) = state.wallets.get_mut(&wallet) {
                d.nonce += 1;
            }
        }
        state.block_number += 1;
        let receipt = Receipt {
            transaction_ref,
            block_number: state.block_number,
            block_hash: keccak256(state.block_number.to_be_bytes()),
            success,
        };
        if state.withhold_receipts {
            state.withheld.push(receipt);
        } else {
            state.receipts.insert(transaction_ref, receipt);
        }
        Ok(transaction_ref)
    }

    async fn receipt(&self, transaction_ref: TxHash) -> Result<Option<Receipt>, ContractError> {
        let state = self.state.lock().unwrap();
        if state.reads_unavailable {
            return Err(ContractError::Unavailable("provider offline".into()));
        }
        Ok(state.receipts.get(&transaction_ref).cloned())
    }
}
