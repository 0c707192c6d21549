//! Collaborator traits the coordinator is generic over.
//!
//! Production uses [`crate::JsonRpcContract`]; tests use the deterministic
//! doubles in `cosign-nullables`.

use crate::error::ContractError;
use cosign_types::{Address, ContractCall, Receipt, Signature, TxHash};
use std::future::Future;

/// The deployed multisig wallet contract, as seen through a provider.
pub trait MultisigContract: Send + Sync {
    /// `getTransactionHash(nonce, to, value, data)` evaluated by the wallet
    /// at `wallet`. The hash is never computed locally.
    fn transaction_hash(
        &self,
        wallet: Address,
        nonce: u64,
        call: &ContractCall,
    ) -> impl Future<Output = Result<TxHash, ContractError>> + Send;

    fn is_owner(
        &self,
        wallet: Address,
        account: Address,
    ) -> impl Future<Output = Result<bool, ContractError>> + Send;

    /// The contract's current replay nonce.
    fn nonce(&self, wallet: Address) -> impl Future<Output = Result<u64, ContractError>> + Send;

    fn signatures_required(
        &self,
        wallet: Address,
    ) -> impl Future<Output = Result<u64, ContractError>> + Send;

    /// Submit `executeTransaction(to, value, data, signatures)` from
    /// `submitter`. Returns the on-chain transaction reference without
    /// waiting for inclusion.
    fn submit_execution(
        &self,
        wallet: Address,
        call: &ContractCall,
        signatures: &[Signature],
        submitter: Address,
    ) -> impl Future<Output = Result<TxHash, ContractError>> + Send;

    /// Receipt for a submitted transaction, `None` while it is not yet mined.
    fn receipt(
        &self,
        transaction_ref: TxHash,
    ) -> impl Future<Output = Result<Option<Receipt>, ContractError>> + Send;
}

/// A wallet able to sign the transaction hash on behalf of one account.
pub trait MessageSigner: Send + Sync {
    fn address(&self) -> Address;

    /// `signMessage(hash)`: an EIP-191 personal signature over the 32 raw
    /// hash bytes.
    fn sign_message(
        &self,
        hash: &TxHash,
    ) -> impl Future<Output = Result<Signature, ContractError>> + Send;
}
