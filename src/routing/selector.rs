//! Route selection over already-gathered fee estimates
//!
//! Pure and synchronous: no I/O happens here.

use crate::fees::FeeEstimate;
use crate::error::{RouterError, RouterResult};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Ranking policy for choosing a network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Lowest `total_fee_native`
    #[default]
    Cheapest,
    /// Lowest static latency rank
    Fastest,
}

impl SelectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionPolicy::Cheapest => "cheapest",
            SelectionPolicy::Fastest => "fastest",
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The chosen network plus every estimate it was chosen from
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    pub chosen_network_id: String,
    /// One entry per registered network, registry order
    pub all_estimates: Vec<FeeEstimate>,
    pub policy: SelectionPolicy,
}

impl RouteDecision {
    /// The winning estimate, which always carries fees
    pub fn chosen(&self) -> Option<&FeeEstimate> {
        self.all_estimates
            .iter()
            .find(|e| e.network_id == self.chosen_network_id)
    }
}

/// Picks one network from a batch of estimates
#[derive(Debug, Clone, Default)]
pub struct RouteSelector {
    latency_ranks: HashMap<String, u32>,
}

impl RouteSelector {
    pub fn new(latency_ranks: HashMap<String, u32>) -> Self {
        Self { latency_ranks }
    }

    /// Select a route under `policy`
    ///
    /// Only successful estimates compete. Equal scores resolve to the
    /// earliest estimate in the batch, i.e. registry order.
    pub fn select(
        &self,
        estimates: Vec<FeeEstimate>,
        policy: SelectionPolicy,
    ) -> RouterResult<RouteDecision> {
        let chosen = estimates
            .iter()
            .filter_map(|e| e.fees().map(|fees| (e, fees)))
            .min_by_key(|(e, fees)| match policy {
                SelectionPolicy::Cheapest => fees.total_fee_native,
                SelectionPolicy::Fastest => u128::from(self.latency_rank(&e.network_id)),
            })
            .map(|(e, _)| e.network_id.clone());

        match chosen {
            Some(chosen_network_id) => {
                tracing::debug!("Route selected: {} ({})", chosen_network_id, policy);
                crate::metrics::record_route_selected(&chosen_network_id, policy.as_str());
                Ok(RouteDecision {
                    chosen_network_id,
                    all_estimates: estimates,
                    policy,
                })
            }
            None => {
                crate::metrics::record_no_viable_route();
                Err(RouterError::NoViableRoute)
            }
        }
    }

    fn latency_rank(&self, network_id: &str) -> u32 {
        self.latency_ranks
            .get(network_id)
            .copied()
            .unwrap_or(u32::MAX)
    }
}
