//! Runtime configuration for the sweeper.
//!
//! Loaded from an optional TOML profile file plus environment overrides.
//! Contract addresses and RPC endpoints stay environment-level concerns and
//! are wired up by the host binary.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Sweeper runtime parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Positions fetched per page.
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Percentage markup applied to the network gas price.
    #[serde(default = "default_gas_markup")]
    pub gas_markup_percent: u64,

    /// Debt to cover on full liquidations, in the debt asset's smallest
    /// unit. Provisional upstream placeholder pending a product decision.
    #[serde(default = "default_debt_to_cover")]
    pub debt_to_cover: String,

    /// Whether full liquidations receive the derivative token. Provisional
    /// upstream placeholder, like `debt_to_cover`.
    #[serde(default)]
    pub receive_itoken: bool,

    /// Interval between scheduled sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Deadline for a single transaction's receipt wait.
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,

    /// Receipt poll interval.
    #[serde(default = "default_confirm_poll")]
    pub confirm_poll_ms: u64,

    /// Secret name holding the executor key.
    #[serde(default = "default_secret_name")]
    pub secret_name: String,

    /// Field key inside the secret (and the env var consulted in
    /// development mode).
    #[serde(default = "default_field_key")]
    pub secret_field_key: String,
}

fn default_page_size() -> u64 {
    50
}
fn default_gas_markup() -> u64 {
    10
}
fn default_debt_to_cover() -> String {
    "0".to_string()
}
fn default_sweep_interval() -> u64 {
    300
}
fn default_confirm_timeout() -> u64 {
    60
}
fn default_confirm_poll() -> u64 {
    1000
}
fn default_secret_name() -> String {
    "liquidator-executor-private-key".to_string()
}
fn default_field_key() -> String {
    "LIQUIDATOR_EXECUTOR_PRIVATE_KEY".to_string()
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            gas_markup_percent: default_gas_markup(),
            debt_to_cover: default_debt_to_cover(),
            receive_itoken: false,
            sweep_interval_secs: default_sweep_interval(),
            confirm_timeout_secs: default_confirm_timeout(),
            confirm_poll_ms: default_confirm_poll(),
            secret_name: default_secret_name(),
            secret_field_key: default_field_key(),
        }
    }
}

impl SweeperConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the environment.
    ///
    /// `SWEEPER_CONFIG` may point at a TOML profile file; individual knobs
    /// can then be overridden with `GAS_PRICE_MARKUP` and
    /// `SWEEP_INTERVAL_SECS`.
    pub fn from_env() -> Self {
        let mut config = match std::env::var("SWEEPER_CONFIG") {
            Ok(path) => Self::from_file(&path).unwrap_or_else(|e| {
                tracing::warn!(path, error = %e, "Failed to load config file, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        };

        if let Ok(Ok(markup)) = std::env::var("GAS_PRICE_MARKUP").map(|v| v.parse()) {
            config.gas_markup_percent = markup;
        }
        if let Ok(Ok(interval)) = std::env::var("SWEEP_INTERVAL_SECS").map(|v| v.parse()) {
            config.sweep_interval_secs = interval;
        }

        config
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn confirm_poll(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_ms)
    }

    /// Log the active configuration at startup.
    pub fn log_config(&self) {
        info!(
            page_size = self.page_size,
            gas_markup_percent = self.gas_markup_percent,
            debt_to_cover = %self.debt_to_cover,
            receive_itoken = self.receive_itoken,
            sweep_interval_secs = self.sweep_interval_secs,
            confirm_timeout_secs = self.confirm_timeout_secs,
            "Sweeper configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_behavior() {
        let config = SweeperConfig::default();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.debt_to_cover, "0");
        assert!(!config.receive_itoken);
    }

    #[test]
    fn toml_roundtrip() {
        let config = SweeperConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: SweeperConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.page_size, config.page_size);
        assert_eq!(parsed.gas_markup_percent, config.gas_markup_percent);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: SweeperConfig = toml::from_str("gas_markup_percent = 25").unwrap();
        assert_eq!(parsed.gas_markup_percent, 25);
        assert_eq!(parsed.page_size, 50);
        assert_eq!(parsed.confirm_timeout_secs, 60);
    }
}
