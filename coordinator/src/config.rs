//! Coordinator tuning knobs, embedded in the daemon's TOML config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// How many times a read-modify-write is re-run after losing a
    /// version race before giving up with `Conflict`.
    #[serde(default = "default_max_update_retries")]
    pub max_update_retries: u32,

    /// Delay between receipt lookups while waiting for an execution.
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    /// How long to wait for a receipt before reporting the chain as
    /// unavailable. The submission stays recorded for the next attempt.
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,

    /// Cross-check a registration against the deployed contract's
    /// `signaturesRequired()` and `isOwner()`.
    #[serde(default = "default_true")]
    pub verify_registration: bool,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_max_update_retries() -> u32 {
    5
}

fn default_receipt_poll_interval_ms() -> u64 {
    1_000
}

fn default_receipt_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

// ── Impl ───────────────────────────────────────────────────────────────

impl CoordinatorConfig {
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_update_retries: default_max_update_retries(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            receipt_timeout_secs: default_receipt_timeout_secs(),
            verify_registration: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config: CoordinatorConfig = toml::from_str("").unwrap();
        assert_eq!(config, CoordinatorConfig::default());
        assert_eq!(config.receipt_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn partial_toml_overrides() {
        let config: CoordinatorConfig = toml::from_str(
            r#"
            max_update_retries = 2
            receipt_poll_interval_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.max_update_retries, 2);
        assert_eq!(config.receipt_poll_interval(), Duration::from_millis(50));
        assert!(config.verify_registration);
    }
}
