//! Chain module - the network registry and per-network RPC clients
//!
//! This module provides:
//! - The immutable network catalogue (defaults, file and environment overrides)
//! - One long-lived client handle per network
//! - Timeout-bounded RPC calls mapped onto the router error taxonomy

pub mod network;
pub mod provider;

#[cfg(test)]
pub mod testing;

pub use network::NetworkConfig;
pub use provider::{ChainClient, ChainProvider, ClientError};

use crate::config::Settings;
use crate::error::{RouterError, RouterResult};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Registry of supported networks, fixed at startup
///
/// Iteration order is registry order, which is also the tie-break order
/// used by route selection.
pub struct NetworkRegistry {
    providers: Vec<Arc<ChainProvider>>,
    index: HashMap<String, usize>,
}

impl NetworkRegistry {
    /// Build the registry from settings plus an environment-style lookup
    ///
    /// Endpoints are validated here but not contacted.
    pub fn from_settings<F>(settings: &Settings, lookup: F) -> RouterResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_timeout = settings.estimator.rpc_timeout();
        let networks = network::resolve_networks(&settings.networks, lookup)?;

        let mut providers = Vec::with_capacity(networks.len());
        for config in networks {
            info!(
                "Registering network {} (chain ID: {})",
                config.id, config.chain_id
            );
            providers.push(ChainProvider::connect(config, rpc_timeout)?);
        }

        Self::from_providers(providers)
    }

    /// Build the registry from pre-constructed clients
    pub fn from_clients(
        entries: Vec<(NetworkConfig, Arc<dyn ChainClient>)>,
        rpc_timeout: Duration,
    ) -> RouterResult<Self> {
        let providers = entries
            .into_iter()
            .map(|(config, client)| ChainProvider::new(config, client, rpc_timeout))
            .collect();
        Self::from_providers(providers)
    }

    fn from_providers(providers: Vec<ChainProvider>) -> RouterResult<Self> {
        let configs: Vec<NetworkConfig> = providers.iter().map(|p| p.config().clone()).collect();
        network::validate(&configs)?;

        let index = configs
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        Ok(Self {
            providers: providers.into_iter().map(Arc::new).collect(),
            index,
        })
    }

    /// Network configurations in registry order
    pub fn list_networks(&self) -> Vec<&NetworkConfig> {
        self.providers.iter().map(|p| p.config()).collect()
    }

    /// Providers in registry order
    pub fn providers(&self) -> &[Arc<ChainProvider>] {
        &self.providers
    }

    /// Get the client for a specific network
    pub fn client_for(&self, network_id: &str) -> RouterResult<Arc<ChainProvider>> {
        self.index
            .get(network_id)
            .map(|&i| self.providers[i].clone())
            .ok_or_else(|| RouterError::NetworkNotFound {
                network: network_id.to_string(),
            })
    }

    /// Static latency rank per network id
    pub fn latency_ranks(&self) -> HashMap<String, u32> {
        self.providers
            .iter()
            .map(|p| (p.id().to_string(), p.config().latency_rank))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Probe every network concurrently
    pub async fn health_check(&self) -> Vec<(String, bool)> {
        let checks = self.providers.iter().map(|p| async move {
            let healthy = p.health_check().await;
            crate::metrics::record_network_health(p.id(), healthy);
            (p.id().to_string(), healthy)
        });

        futures::future::join_all(checks).await
    }
}
