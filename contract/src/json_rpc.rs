//! [`MultisigContract`] over an Ethereum JSON-RPC endpoint.
//!
//! Reads go through `eth_call`, submissions through `eth_sendTransaction`
//! (the node holds the submitter's key), receipts through
//! `eth_getTransactionReceipt`.

use crate::bindings::{
    executeTransactionCall, getTransactionHashCall, isOwnerCall, nonceCall,
    signaturesRequiredCall,
};
use crate::error::ContractError;
use crate::traits::MultisigContract;
use alloy_primitives::U64;
use alloy_sol_types::SolCall;
use cosign_types::{Address, Bytes, ContractCall, Receipt, Signature, TxHash, U256};
use cosign_utils::clean_provider_error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default timeout for a single JSON-RPC request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON-RPC client bound to one provider URL.
pub struct JsonRpcContract {
    http_client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: TxHash,
    block_number: U64,
    block_hash: TxHash,
    #[serde(default)]
    status: Option<U64>,
}

impl JsonRpcContract {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one JSON-RPC request and return its `result`.
    ///
    /// Transport failures map to [`ContractError::Unavailable`]; an error
    /// object in the response maps to [`ContractError::Rejected`].
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, ContractError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ContractError::Unavailable(format!("{method} timed out: {e}"))
                } else if e.is_connect() {
                    ContractError::Unavailable(format!("connection failed: {e}"))
                } else {
                    ContractError::Unavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ContractError::Unavailable(format!(
                "{method}: HTTP status {}",
                response.status()
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| ContractError::Decode(format!("{method}: {e}")))?;

        if let Some(err) = body.error {
            tracing::debug!(method, code = err.code, message = %err.message, "provider returned error");
            return Err(ContractError::Rejected(
                clean_provider_error(&err.message).to_string(),
            ));
        }
        Ok(body.result.unwrap_or(Value::Null))
    }

    /// `eth_call` against `wallet` at the latest block.
    async fn call<C: SolCall>(&self, wallet: Address, call: &C) -> Result<C::Return, ContractError> {
        let data = Bytes::from(call.abi_encode());
        let result = self
            .rpc_call(
                "eth_call",
                json!([{ "to": wallet, "data": data }, "latest"]),
            )
            .await
            .map_err(|e| match e {
                // A reverted view call means the provider could not answer.
                ContractError::Rejected(msg) => ContractError::Unavailable(msg),
                other => other,
            })?;
        let output: Bytes = serde_json::from_value(result)
            .map_err(|e| ContractError::Decode(format!("{}: {e}", C::SIGNATURE)))?;
        C::abi_decode_returns(&output, true)
            .map_err(|e| ContractError::Decode(format!("{}: {e}", C::SIGNATURE)))
    }
}

impl MultisigContract for JsonRpcContract {
    async fn transaction_hash(
        &self,
        wallet: Address,
        nonce: u64,
        call: &ContractCall,
    ) -> Result<TxHash, ContractError> {
        let request = getTransactionHashCall {
            _nonce: U256::from(nonce),
            to: call.to,
            value: call.value,
            data: call.data.clone(),
        };
        Ok(self.call(wallet, &request).await?.hash)
    }

    async fn is_owner(&self, wallet: Address, account: Address) -> Result<bool, ContractError> {
        Ok(self.call(wallet, &isOwnerCall { owner: account }).await?._0)
    }

    async fn nonce(&self, wallet: Address) -> Result<u64, ContractError> {
        let value = self.call(wallet, &nonceCall {}).await?._0;
        u64::try_from(value).map_err(|_| ContractError::Decode(format!("nonce out of range: {value}")))
    }

    async fn signatures_required(&self, wallet: Address) -> Result<u64, ContractError> {
        let value = self.call(wallet, &signaturesRequiredCall {}).await?._0;
        u64::try_from(value)
            .map_err(|_| ContractError::Decode(format!("signaturesRequired out of range: {value}")))
    }

    async fn submit_execution(
        &self,
        wallet: Address,
        call: &ContractCall,
        signatures: &[Signature],
        submitter: Address,
    ) -> Result<TxHash, ContractError> {
        let request = executeTransactionCall {
            to: call.to,
            value: call.value,
            data: call.data.clone(),
            signatures: signatures.iter().map(Signature::to_bytes).collect(),
        };
        let data = Bytes::from(request.abi_encode());
        let result = self
            .rpc_call(
                "eth_sendTransaction",
                json!([{ "from": submitter, "to": wallet, "data": data }]),
            )
            .await?;
        let transaction_ref: TxHash = serde_json::from_value(result)
            .map_err(|e| ContractError::Decode(format!("eth_sendTransaction: {e}")))?;
        tracing::debug!(%wallet, %transaction_ref, "execution submitted");
        Ok(transaction_ref)
    }

    async fn receipt(&self, transaction_ref: TxHash) -> Result<Option<Receipt>, ContractError> {
        let result = self
            .rpc_call("eth_getTransactionReceipt", json!([transaction_ref]))
            .await
            .map_err(|e| match e {
                ContractError::Rejected(msg) => ContractError::Unavailable(msg),
                other => other,
            })?;
        parse_receipt(result)
    }
}

/// Decode an `eth_getTransactionReceipt` result. `null` means not yet mined.
fn parse_receipt(value: Value) -> Result<Option<Receipt>, ContractError> {
    if value.is_null() {
        return Ok(None);
    }
    let raw: RawReceipt = serde_json::from_value(value)
        .map_err(|e| ContractError::Decode(format!("receipt: {e}")))?;
    Ok(Some(Receipt {
        transaction_ref: raw.transaction_hash,
        block_number: raw.block_number.to::<u64>(),
        block_hash: raw.block_hash,
        // Pre-Byzantium receipts carry no status; treat them as success.
        success: raw.status.map_or(true, |s| s == U64::from(1u64)),
    }))
}
