//! HTTP request handlers.
//!
//! Every handler is generic over the store and contract so the same routes
//! serve the LMDB-backed daemon and the in-memory test harness.

use crate::error::RpcError;
use crate::pagination::effective_limit;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use cosign_contract::MultisigContract;
use cosign_coordinator::{MultisigService, WalletRegistration};
use cosign_store::{ExecutionStore, SortOrder, TransactionQuery};
use cosign_types::{
    Action, Address, Receipt, Signature, Transaction, TransactionId, TransactionStatus, Wallet,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

pub type SharedService<S, C> = Arc<MultisigService<S, C>>;

fn parse_address(raw: &str) -> Result<Address, RpcError> {
    Address::from_str(raw).map_err(|e| RpcError::InvalidRequest(format!("bad address {raw}: {e}")))
}

fn parse_id(raw: &str) -> Result<TransactionId, RpcError> {
    raw.parse::<u64>()
        .map(TransactionId)
        .map_err(|_| RpcError::InvalidRequest(format!("bad transaction id: {raw}")))
}

// ── Health / metrics ─────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn metrics<S, C>(
    State(service): State<SharedService<S, C>>,
) -> Result<impl IntoResponse, RpcError>
where
    S: ExecutionStore + 'static,
    C: MultisigContract + 'static,
{
    let body = service
        .metrics()
        .encode_text()
        .map_err(|e| RpcError::Server(format!("metrics encoding failed: {e}")))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

// ── Wallets ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignerParams {
    pub signer: Option<String>,
}

pub async fn register_wallet<S, C>(
    State(service): State<SharedService<S, C>>,
    Json(registration): Json<WalletRegistration>,
) -> Result<(StatusCode, Json<Wallet>), RpcError>
where
    S: ExecutionStore + 'static,
    C: MultisigContract + 'static,
{
    let wallet = service.register_wallet(registration).await?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

pub async fn list_wallets<S, C>(
    State(service): State<SharedService<S, C>>,
    Query(params): Query<SignerParams>,
) -> Result<Json<Vec<Wallet>>, RpcError>
where
    S: ExecutionStore + 'static,
    C: MultisigContract + 'static,
{
    let signer = params
        .signer
        .as_deref()
        .ok_or_else(|| RpcError::InvalidRequest("signer query parameter is required".into()))?;
    let signer = parse_address(signer)?;
    Ok(Json(service.wallets_for_signer(&signer)?))
}

pub async fn get_wallet<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(address): Path<String>,
) -> Result<Json<Wallet>, RpcError>
where
    S: ExecutionStore + 'static,
    C: MultisigContract + 'static,
{
    let address = parse_address(&address)?;
    Ok(Json(service.wallet(&address)?))
}

// ── Transactions ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    pub status: Option<String>,
    pub nonce: Option<u64>,
    pub order: Option<String>,
    pub limit: Option<usize>,
}

impl TransactionListParams {
    pub fn to_query(&self) -> Result<TransactionQuery, RpcError> {
        let status = self
            .status
            .as_deref()
            .map(TransactionStatus::from_str)
            .transpose()
            .map_err(RpcError::InvalidRequest)?;
        let order = match self.order.as_deref() {
            None | Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(other) => {
                return Err(RpcError::InvalidRequest(format!(
                    "order must be asc or desc, got {other}"
                )))
            }
        };
        Ok(TransactionQuery {
            wallet: None,
            nonce: self.nonce,
            status,
            order,
            limit: Some(effective_limit(self.limit)),
        })
    }
}

pub async fn list_transactions<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(address): Path<String>,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<Vec<Transaction>>, RpcError>
where
    S: ExecutionStore + 'static,
    C: MultisigContract + 'static,
{
    let wallet = parse_address(&address)?;
    let query = params.to_query()?;
    Ok(Json(service.transactions(wallet, query)?))
}

/// `{"proposer": "0x…", "action": "addSigner", "signer": "0x…", "newThreshold": 3}`
#[derive(Debug, Deserialize)]
pub struct ProposeRequest {
    pub proposer: Address,
    #[serde(flatten)]
    pub action: Action,
}

pub async fn propose<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(address): Path<String>,
    Json(request): Json<ProposeRequest>,
) -> Result<(StatusCode, Json<Transaction>), RpcError>
where
    S: ExecutionStore + 'static,
    C: MultisigContract + 'static,
{
    let wallet = parse_address(&address)?;
    let tx = service
        .propose(wallet, request.action, request.proposer)
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn get_transaction<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(id): Path<String>,
) -> Result<Json<Transaction>, RpcError>
where
    S: ExecutionStore + 'static,
    C: MultisigContract + 'static,
{
    let id = parse_id(&id)?;
    Ok(Json(service.transaction(id)?))
}

// ── Signing / execution ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignRequest {
    pub signer: Address,
    pub signature: Signature,
}

pub async fn sign<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(id): Path<String>,
    Json(request): Json<SignRequest>,
) -> Result<Json<Transaction>, RpcError>
where
    S: ExecutionStore + 'static,
    C: MultisigContract + 'static,
{
    let id = parse_id(&id)?;
    if request.signature.is_empty() {
        return Err(RpcError::InvalidRequest("signature is empty".into()));
    }
    Ok(Json(service.sign(id, request.signer, request.signature)?))
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub submitter: Address,
}

pub async fn execute<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(id): Path<String>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<Receipt>, RpcError>
where
    S: ExecutionStore + 'static,
    C: MultisigContract + 'static,
{
    let id = parse_id(&id)?;
    Ok(Json(service.execute(id, request.submitter).await?))
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub requester: Address,
}

pub async fn cancel<S, C>(
    State(service): State<SharedService<S, C>>,
    Path(id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<Transaction>, RpcError>
where
    S: ExecutionStore + 'static,
    C: MultisigContract + 'static,
{
    let id = parse_id(&id)?;
    Ok(Json(service.cancel(id, request.requester)?))
}
