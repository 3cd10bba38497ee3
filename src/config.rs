//! Configuration management for the L2 router
//!
//! Loads configuration from a TOML file with environment variable substitution.
//! Every section has defaults, so an absent default file yields a working
//! configuration backed by the built-in network table.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_ENV: &str = "L2_ROUTER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

lazy_static! {
    static ref ENV_VAR_PATTERN: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
    pub estimator: EstimatorConfig,
    pub price_feed: PriceFeedConfig,
    pub wallet: WalletConfig,
    /// Overrides of the built-in networks, or additional networks
    pub networks: Vec<NetworkOverride>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Upper bound for a single RPC round trip
    pub rpc_timeout_ms: u64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            rpc_timeout_ms: 5_000,
        }
    }
}

impl EstimatorConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PriceFeedConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_ms: u64,
    pub cache_ttl_secs: u64,
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            timeout_ms: 3_000,
            cache_ttl_secs: 30,
        }
    }
}

impl PriceFeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Name of the environment variable holding the hex private key
    pub private_key_env: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: "PRIVATE_KEY".to_string(),
        }
    }
}

/// Per-network entry in the configuration file
///
/// Fields left out keep the built-in value for a known `id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkOverride {
    pub id: String,
    pub chain_id: Option<u64>,
    pub rpc_endpoint: Option<String>,
    pub native_symbol: Option<String>,
    pub latency_rank: Option<u32>,
}

impl Settings {
    /// Load settings from the configuration file
    pub fn load() -> Result<Self> {
        match env::var(CONFIG_ENV) {
            Ok(path) => Self::load_from(Path::new(&path)),
            Err(_) => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    tracing::info!("No config file at {:?}, using built-in defaults", path);
                    let settings = Settings::default();
                    settings.validate()?;
                    Ok(settings)
                }
            }
        }
    }

    /// Load settings from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::parse(&config_str)
    }

    /// Parse settings from TOML text
    pub fn parse(config_str: &str) -> Result<Self> {
        // Substitute environment variables
        let config_str = substitute_env_vars(config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.estimator.rpc_timeout_ms == 0 {
            anyhow::bail!("estimator.rpc_timeout_ms must be greater than zero");
        }

        if self.price_feed.enabled {
            if self.price_feed.timeout_ms == 0 {
                anyhow::bail!("price_feed.timeout_ms must be greater than zero");
            }
            reqwest::Url::parse(&self.price_feed.base_url)
                .with_context(|| format!("Invalid price feed URL: {}", self.price_feed.base_url))?;
        }

        for network in &self.networks {
            if network.id.trim().is_empty() {
                anyhow::bail!("Network entry with an empty id");
            }
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();

    for cap in ENV_VAR_PATTERN.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}
