//! cosign daemon: opens the wallet store, connects to the chain provider and
//! serves the HTTP API until interrupted.

mod config;
mod shutdown;

use anyhow::Context;
use clap::Parser;
use config::DaemonConfig;
use cosign_contract::JsonRpcContract;
use cosign_coordinator::MultisigService;
use cosign_rpc::RpcServer;
use cosign_store_lmdb::LmdbEnvironment;
use cosign_types::SystemClock;
use cosign_utils::{format_wait, init_logging, LogFormat};
use shutdown::Shutdown;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "cosign-daemon", about = "Multisig wallet coordination daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "COSIGN_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the wallet store.
    #[arg(long, env = "COSIGN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Ethereum JSON-RPC provider URL.
    #[arg(long, env = "COSIGN_ETH_RPC_URL")]
    eth_rpc_url: Option<String>,

    /// HTTP API port.
    #[arg(long, env = "COSIGN_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "COSIGN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "COSIGN_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the coordinator and its HTTP API.
    Serve,
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Print,
}

impl Cli {
    /// File settings (or defaults) with CLI flags and env vars applied on top.
    fn resolve_config(&self) -> anyhow::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(url) = &self.eth_rpc_url {
            config.chain.eth_rpc_url = url.clone();
        }
        if let Some(port) = self.rpc_port {
            config.rpc.port = port;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match cli.command {
        Command::Config {
            action: ConfigAction::Print,
        } => {
            print!("{}", config.to_toml_string());
            Ok(())
        }
        Command::Serve => {
            init_logging(config.log_format, &config.log_level).map_err(anyhow::Error::msg)?;
            serve(config).await
        }
    }
}

async fn serve(config: DaemonConfig) -> anyhow::Result<()> {
    tracing::info!(
        "Starting cosign daemon (data: {}, provider: {}, HTTP: {}:{})",
        config.data_dir.display(),
        config.chain.eth_rpc_url,
        config.rpc.bind_address,
        config.rpc.port,
    );

    let store = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())
        .with_context(|| format!("opening store at {}", config.data_dir.display()))?;
    let contract = JsonRpcContract::with_timeout(
        config.chain.eth_rpc_url.clone(),
        Duration::from_secs(config.chain.request_timeout_secs),
    );
    let service = Arc::new(MultisigService::new(
        Arc::new(store),
        Arc::new(contract),
        Arc::new(SystemClock),
        config.coordinator.clone(),
    ));

    let shutdown = Shutdown::new();
    let server = RpcServer::new(config.rpc.clone());
    let stopped = shutdown.signalled();
    let mut server_task = tokio::spawn(async move { server.start(service, stopped).await });

    tokio::select! {
        result = &mut server_task => {
            result.context("HTTP server task panicked")??;
            anyhow::bail!("HTTP server exited unexpectedly");
        }
        _ = shutdown.on_os_signal() => {
            let grace = config.shutdown_grace();
            tracing::info!("Stopping HTTP API, draining requests for up to {}", format_wait(grace));
            match tokio::time::timeout(grace, &mut server_task).await {
                Ok(result) => result.context("HTTP server task panicked")??,
                Err(_) => {
                    tracing::warn!("requests still in flight after {}, aborting", format_wait(grace));
                    server_task.abort();
                }
            }
        }
    }

    tracing::info!("cosign daemon exited cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flags_override_file_settings() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"\n[rpc]\nport = 9000").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from([
            "cosign-daemon",
            "--config",
            path.as_str(),
            "--rpc-port",
            "9100",
            "--log-format",
            "json",
            "serve",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.rpc.port, 9100);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn config_print_parses() {
        let cli = Cli::try_parse_from(["cosign-daemon", "config", "print"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Print
            }
        ));
        assert_eq!(cli.resolve_config().unwrap(), DaemonConfig::default());
    }
}
