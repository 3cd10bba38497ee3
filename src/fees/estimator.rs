//! Concurrent fee estimation over every registered network

use super::price::PriceConverter;
use super::{FeeEstimate, Fees, TransferRequest};
use crate::chain::{ChainProvider, NetworkRegistry};
use crate::error::RouterError;
use crate::tx::gas;

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fans a transfer out to all networks and gathers one estimate per network
pub struct FeeEstimator {
    registry: Arc<NetworkRegistry>,
    prices: Option<Arc<PriceConverter>>,
}

impl FeeEstimator {
    pub fn new(registry: Arc<NetworkRegistry>, prices: Option<Arc<PriceConverter>>) -> Self {
        Self { registry, prices }
    }

    /// Estimate `transfer` on every network, in registry order
    ///
    /// Returns after every network has answered or hit its RPC timeout.
    /// The per-network futures live inside this one, so dropping it abandons
    /// any calls still in flight.
    pub async fn estimate(&self, transfer: &TransferRequest, include_usd: bool) -> Vec<FeeEstimate> {
        let started = Instant::now();

        let estimates = join_all(
            self.registry
                .providers()
                .iter()
                .map(|provider| self.estimate_network(provider, transfer, include_usd)),
        )
        .await;

        let succeeded = estimates.iter().filter(|e| e.is_success()).count();
        info!(
            "Estimated transfer on {} networks ({} succeeded) in {:?}",
            estimates.len(),
            succeeded,
            started.elapsed()
        );

        estimates
    }

    async fn estimate_network(
        &self,
        provider: &ChainProvider,
        transfer: &TransferRequest,
        include_usd: bool,
    ) -> FeeEstimate {
        let network_id = provider.id();
        let started = Instant::now();

        let quote =
            gas::quote_transfer(provider, transfer.from, transfer.to, transfer.amount_wei).await;

        let estimate = match quote {
            Ok(quote) => match quote.total_fee_wei() {
                Some(total_fee_native) => {
                    let total_fee_usd = if include_usd {
                        self.fee_in_usd(provider, total_fee_native).await
                    } else {
                        None
                    };

                    FeeEstimate::success(
                        network_id,
                        Fees {
                            gas_price_wei: quote.gas_price_wei,
                            gas_limit: quote.gas_limit,
                            total_fee_native,
                            total_fee_usd,
                        },
                    )
                }
                None => FeeEstimate::failure(
                    network_id,
                    RouterError::EstimationFailed {
                        network: network_id.to_string(),
                        message: "total fee overflows".to_string(),
                    },
                ),
            },
            Err(e) => {
                debug_assert!(e.is_per_network(), "unexpected failure kind {}", e.kind());
                warn!("Estimation failed on {}: {}", network_id, e);
                FeeEstimate::failure(network_id, e)
            }
        };

        crate::metrics::record_estimate(
            network_id,
            estimate.is_success(),
            started.elapsed().as_secs_f64(),
        );
        estimate
    }

    /// Best-effort fiat annotation; any failure just leaves it absent
    async fn fee_in_usd(&self, provider: &ChainProvider, total_fee_wei: u128) -> Option<f64> {
        let prices = self.prices.as_ref()?;
        let symbol = &provider.config().native_symbol;

        match prices.to_usd(total_fee_wei, symbol).await {
            Ok(usd) => Some(usd),
            Err(e) => {
                debug!("No USD fee for {}: {}", provider.id(), e);
                None
            }
        }
    }
}
