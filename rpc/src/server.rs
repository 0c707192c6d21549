//! Axum-based HTTP server.

use crate::error::RpcError;
use crate::handlers::{self, SharedService};
use axum::routing::{get, post};
use axum::Router;
use cosign_contract::MultisigContract;
use cosign_store::ExecutionStore;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow cross-origin requests from browser front ends.
    #[serde(default = "default_allow_cors")]
    pub allow_cors: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            allow_cors: default_allow_cors(),
        }
    }
}

// ── Serde default helpers ───────────────────────────────────────────────

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7080
}

fn default_allow_cors() -> bool {
    true
}

/// Every route of the API, bound to `service`.
pub fn router<S, C>(service: SharedService<S, C>) -> Router
where
    S: ExecutionStore + 'static,
    C: MultisigContract + 'static,
{
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics::<S, C>))
        .route(
            "/wallets",
            get(handlers::list_wallets::<S, C>).post(handlers::register_wallet::<S, C>),
        )
        .route("/wallets/:address", get(handlers::get_wallet::<S, C>))
        .route(
            "/wallets/:address/transactions",
            get(handlers::list_transactions::<S, C>),
        )
        .route(
            "/wallets/:address/proposals",
            post(handlers::propose::<S, C>),
        )
        .route("/transactions/:id", get(handlers::get_transaction::<S, C>))
        .route(
            "/transactions/:id/signatures",
            post(handlers::sign::<S, C>),
        )
        .route("/transactions/:id/execute", post(handlers::execute::<S, C>))
        .route("/transactions/:id/cancel", post(handlers::cancel::<S, C>))
        .with_state(service)
}

pub struct RpcServer {
    config: RpcConfig,
}

impl RpcServer {
    pub fn new(config: RpcConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn start<S, C>(
        &self,
        service: SharedService<S, C>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), RpcError>
    where
        S: ExecutionStore + 'static,
        C: MultisigContract + 'static,
    {
        let addr = format!("{}:{}", self.config.bind_address, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {addr}: {e}")))?;
        self.serve(listener, service, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<S, C>(
        &self,
        listener: TcpListener,
        service: SharedService<S, C>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), RpcError>
    where
        S: ExecutionStore + 'static,
        C: MultisigContract + 'static,
    {
        let mut app = router(service);
        if self.config.allow_cors {
            app = app.layer(CorsLayer::permissive());
        }
        if let Ok(local) = listener.local_addr() {
            info!("HTTP API listening on {local}");
        }
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("HTTP API stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = RpcConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.port, 7080);
        assert!(config.allow_cors);
    }

    #[test]
    fn config_partial_json() {
        let config: RpcConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.bind_address, "127.0.0.1");
    }
}
