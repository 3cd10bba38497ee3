//! Network catalogue: built-in defaults plus file and environment overrides

use crate::config::NetworkOverride;
use crate::error::{RouterError, RouterResult};

use reqwest::Url;
use serde::Serialize;
use std::collections::HashSet;

/// Immutable connection parameters for one Layer-2 network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    /// Registry key, e.g. `arbitrum`
    pub id: String,
    /// EIP-155 chain identifier
    pub chain_id: u64,
    pub rpc_endpoint: String,
    pub native_symbol: String,
    /// Static expected-latency rank, lower confirms faster
    pub latency_rank: u32,
}

impl NetworkConfig {
    pub fn new(
        id: impl Into<String>,
        chain_id: u64,
        rpc_endpoint: impl Into<String>,
        native_symbol: impl Into<String>,
        latency_rank: u32,
    ) -> Self {
        Self {
            id: id.into(),
            chain_id,
            rpc_endpoint: rpc_endpoint.into(),
            native_symbol: native_symbol.into(),
            latency_rank,
        }
    }

    /// Parse the RPC endpoint, failing on anything that is not an http(s) URL
    pub fn endpoint_url(&self) -> RouterResult<Url> {
        let url = Url::parse(&self.rpc_endpoint).map_err(|e| {
            RouterError::Config(format!("Invalid RPC endpoint for {}: {}", self.id, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(RouterError::Config(format!(
                "Unsupported RPC scheme {} for {}",
                other, self.id
            ))),
        }
    }

    /// Environment variable consulted for an endpoint override
    pub fn rpc_env_var(&self) -> String {
        format!("{}_RPC_URL", self.id.to_uppercase().replace('-', "_"))
    }
}

/// Built-in network table, in registry order
pub fn default_networks() -> Vec<NetworkConfig> {
    vec![
        NetworkConfig::new("arbitrum", 42161, "https://arb1.arbitrum.io/rpc", "ETH", 2),
        NetworkConfig::new("optimism", 10, "https://mainnet.optimism.io", "ETH", 1),
        NetworkConfig::new("base", 8453, "https://mainnet.base.org", "ETH", 3),
    ]
}

/// Resolve the final network list
///
/// Order: built-in defaults, then file entries (merged by id or appended),
/// then `<ID>_RPC_URL` lookups. Every endpoint is validated.
pub fn resolve_networks<F>(
    overrides: &[NetworkOverride],
    lookup: F,
) -> RouterResult<Vec<NetworkConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut networks = default_networks();

    for entry in overrides {
        match networks.iter_mut().find(|n| n.id == entry.id) {
            Some(existing) => apply_override(existing, entry),
            None => networks.push(new_network(entry)?),
        }
    }

    for network in &mut networks {
        if let Some(url) = lookup(&network.rpc_env_var()).filter(|u| !u.trim().is_empty()) {
            tracing::debug!("RPC endpoint for {} overridden from environment", network.id);
            network.rpc_endpoint = url.trim().to_string();
        }
    }

    validate(&networks)?;
    Ok(networks)
}

fn apply_override(network: &mut NetworkConfig, entry: &NetworkOverride) {
    if let Some(chain_id) = entry.chain_id {
        network.chain_id = chain_id;
    }
    if let Some(ref url) = entry.rpc_endpoint {
        network.rpc_endpoint = url.clone();
    }
    if let Some(ref symbol) = entry.native_symbol {
        network.native_symbol = symbol.clone();
    }
    if let Some(rank) = entry.latency_rank {
        network.latency_rank = rank;
    }
}

fn new_network(entry: &NetworkOverride) -> RouterResult<NetworkConfig> {
    let chain_id = entry.chain_id.ok_or_else(|| {
        RouterError::Config(format!("Network {} needs a chain_id", entry.id))
    })?;
    let rpc_endpoint = entry.rpc_endpoint.clone().ok_or_else(|| {
        RouterError::Config(format!("Network {} needs an rpc_endpoint", entry.id))
    })?;

    Ok(NetworkConfig {
        id: entry.id.clone(),
        chain_id,
        rpc_endpoint,
        native_symbol: entry.native_symbol.clone().unwrap_or_else(|| "ETH".to_string()),
        latency_rank: entry.latency_rank.unwrap_or(u32::MAX),
    })
}

/// Check id uniqueness and endpoint well-formedness
pub fn validate(networks: &[NetworkConfig]) -> RouterResult<()> {
    if networks.is_empty() {
        return Err(RouterError::Config("No networks configured".to_string()));
    }

    let mut seen = HashSet::new();
    for network in networks {
        if !seen.insert(network.id.as_str()) {
            return Err(RouterError::Config(format!(
                "Duplicate network id {}",
                network.id
            )));
        }
        network.endpoint_url()?;
    }

    Ok(())
}
