//! Daemon configuration, loaded from TOML with per-field defaults.

use cosign_coordinator::CoordinatorConfig;
use cosign_rpc::RpcConfig;
use cosign_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in mebibytes.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How long in-flight requests may run after a stop signal.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub coordinator: CoordinatorConfig,
}

/// Connection to the Ethereum JSON-RPC provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_eth_rpc_url")]
    pub eth_rpc_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            eth_rpc_url: default_eth_rpc_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ── Serde default helpers ───────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./cosign_data")
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_log_format() -> LogFormat {
    LogFormat::Human
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

fn default_eth_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("DaemonConfig is always serializable to TOML")
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            rpc: RpcConfig::default(),
            chain: ChainConfig::default(),
            coordinator: CoordinatorConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = DaemonConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./cosign_data"));
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.chain.eth_rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.rpc.port, 7080);
        assert_eq!(config.map_size_bytes(), 1024 * 1024 * 1024);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(10));
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            log_format = "json"

            [rpc]
            port = 9999

            [coordinator]
            receipt_timeout_secs = 30
        "#;
        let config = DaemonConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.rpc.port, 9999);
        assert_eq!(config.rpc.bind_address, "127.0.0.1"); // default
        assert_eq!(config.coordinator.receipt_timeout_secs, 30);
        assert_eq!(config.coordinator.max_update_retries, 5); // default
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn toml_roundtrip_preserves_values() {
        let mut config = DaemonConfig::default();
        config.chain.eth_rpc_url = "http://node:8545".into();
        config.coordinator.verify_registration = false;
        let parsed = DaemonConfig::from_toml_str(&config.to_toml_string()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "data_dir = \"/var/lib/cosign\"").unwrap();
        let config = DaemonConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/cosign"));
    }

    #[test]
    fn missing_file_returns_read_error() {
        let result = DaemonConfig::from_toml_file(Path::new("/nonexistent/cosign.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let result = DaemonConfig::from_toml_str(r#"log_format = "xml""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
