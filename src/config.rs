//! Configuration management for the SendSol wallet service
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::chain::Cluster;
use crate::tx::RoundingMode;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
    pub network: NetworkConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub fees: FeeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub cluster: Cluster,
    /// RPC endpoints, tried in order on read failures. Empty means the
    /// public endpoint for `cluster`.
    #[serde(default)]
    pub rpc_urls: Vec<String>,
    #[serde(default = "default_commitment")]
    pub commitment: Commitment,
    #[serde(default = "default_confirm_poll_ms")]
    pub confirm_poll_interval_ms: u64,
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    #[serde(default)]
    pub adapters: Vec<AdapterConfig>,
}

/// A named keypair file offered to the session as a wallet adapter
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    pub name: String,
    pub keypair_path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeeConfig {
    #[serde(default)]
    pub rounding: RoundingMode,
}

fn default_commitment() -> Commitment {
    Commitment::Confirmed
}

fn default_confirm_poll_ms() -> u64 {
    500
}

fn default_confirm_timeout_secs() -> u64 {
    90
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("SENDSOL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml(&config_str)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml(input: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(input);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        for url in &self.network.rpc_urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("RPC URL {} must be http(s)", url);
            }
        }

        if self.network.confirm_poll_interval_ms == 0 {
            anyhow::bail!("confirm_poll_interval_ms must be greater than zero");
        }

        for adapter in &self.wallet.adapters {
            if adapter.name.trim().is_empty() {
                anyhow::bail!("Wallet adapter with empty name");
            }
        }

        if self.wallet.adapters.is_empty() {
            tracing::warn!("No wallet adapters configured - connect will always fail");
        }

        Ok(())
    }

    /// RPC endpoints for the configured cluster
    pub fn rpc_urls(&self) -> Vec<String> {
        if self.network.rpc_urls.is_empty() {
            vec![self.network.cluster.default_rpc_url().to_string()]
        } else {
            self.network.rpc_urls.clone()
        }
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
