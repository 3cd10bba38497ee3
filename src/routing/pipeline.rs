//! Composition of estimation, selection and dispatch

use super::selector::{RouteDecision, RouteSelector, SelectionPolicy};
use crate::chain::NetworkRegistry;
use crate::error::{RouterError, RouterResult};
use crate::fees::{FeeEstimate, FeeEstimator, TransferRequest};
use crate::tx::TransactionDispatcher;

use ethers::types::H256;
use std::sync::Arc;
use tracing::{info, instrument};

/// Outcome of a composed route-and-send
#[derive(Debug, Clone)]
pub struct RoutedTransfer {
    pub decision: RouteDecision,
    pub transaction_hash: H256,
}

/// Entry point for every routing operation
pub struct RoutePipeline {
    registry: Arc<NetworkRegistry>,
    estimator: FeeEstimator,
    selector: RouteSelector,
    dispatcher: Option<TransactionDispatcher>,
}

impl RoutePipeline {
    pub fn new(
        registry: Arc<NetworkRegistry>,
        estimator: FeeEstimator,
        dispatcher: Option<TransactionDispatcher>,
    ) -> Self {
        let selector = RouteSelector::new(registry.latency_ranks());
        Self {
            registry,
            estimator,
            selector,
            dispatcher,
        }
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub async fn estimate(&self, transfer: &TransferRequest, include_usd: bool) -> Vec<FeeEstimate> {
        self.estimator.estimate(transfer, include_usd).await
    }

    /// Estimate on every network, then pick one
    pub async fn route(
        &self,
        transfer: &TransferRequest,
        include_usd: bool,
        policy: SelectionPolicy,
    ) -> RouterResult<RouteDecision> {
        let estimates = self.estimator.estimate(transfer, include_usd).await;
        self.selector.select(estimates, policy)
    }

    /// Send on an explicitly named network
    pub async fn send(&self, network_id: &str, transfer: &TransferRequest) -> RouterResult<H256> {
        self.dispatcher()?
            .send(network_id, transfer.from, transfer.to, transfer.amount_wei)
            .await
    }

    /// Estimate, select, then dispatch on the winner
    ///
    /// The dispatcher reads nonce and gas again; nothing captured during
    /// estimation is reused for the transaction itself.
    #[instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4(), policy = %policy))]
    pub async fn route_and_send(
        &self,
        transfer: &TransferRequest,
        include_usd: bool,
        policy: SelectionPolicy,
    ) -> RouterResult<RoutedTransfer> {
        let dispatcher = self.dispatcher()?;
        let decision = self.route(transfer, include_usd, policy).await?;

        match decision.chosen().and_then(FeeEstimate::fees) {
            Some(fees) => info!(
                "Dispatching transfer on {} (estimated fee {} wei)",
                decision.chosen_network_id, fees.total_fee_native
            ),
            None => info!("Dispatching transfer on {}", decision.chosen_network_id),
        }
        let transaction_hash = dispatcher
            .send(
                &decision.chosen_network_id,
                transfer.from,
                transfer.to,
                transfer.amount_wei,
            )
            .await?;

        Ok(RoutedTransfer {
            decision,
            transaction_hash,
        })
    }

    fn dispatcher(&self) -> RouterResult<&TransactionDispatcher> {
        self.dispatcher
            .as_ref()
            .ok_or_else(|| RouterError::SigningFailed("no signing key configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::testing::FakeClient;
    use crate::chain::{ChainClient, NetworkConfig};
    use crate::tx::SigningKey;
    use ethers::types::{Address, U256};
    use std::time::Duration;

    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    struct Fixture {
        pipeline: RoutePipeline,
        clients: Vec<Arc<FakeClient>>,
    }

    fn fixture(clients: Vec<FakeClient>, with_key: bool) -> Fixture {
        let clients: Vec<Arc<FakeClient>> = clients.into_iter().map(Arc::new).collect();
        let configs = vec![
            NetworkConfig::new("arbitrum", 42161, "http://arb.local", "ETH", 2),
            NetworkConfig::new("optimism", 10, "http://op.local", "ETH", 1),
            NetworkConfig::new("base", 8453, "http://base.local", "ETH", 3),
        ];
        let entries: Vec<(NetworkConfig, Arc<dyn ChainClient>)> = configs
            .into_iter()
            .zip(clients.iter().cloned())
            .map(|(c, client)| (c, client as Arc<dyn ChainClient>))
            .collect();

        let registry =
            Arc::new(NetworkRegistry::from_clients(entries, Duration::from_millis(200)).unwrap());
        let estimator = FeeEstimator::new(registry.clone(), None);
        let dispatcher = with_key.then(|| {
            TransactionDispatcher::new(registry.clone(), SigningKey::parse(DEV_KEY).unwrap())
        });

        Fixture {
            pipeline: RoutePipeline::new(registry, estimator, dispatcher),
            clients,
        }
    }

    fn transfer() -> TransferRequest {
        TransferRequest {
            from: SigningKey::parse(DEV_KEY).unwrap().address(),
            to: Address::repeat_byte(0x42),
            amount_wei: U256::exp10(17),
        }
    }

    #[tokio::test]
    async fn test_route_skips_timed_out_network() {
        let f = fixture(
            vec![
                FakeClient::new(5, 1_900),
                FakeClient::new(1, 21_000).with_delay(Duration::from_secs(10)),
                FakeClient::new(5, 3_000),
            ],
            false,
        );

        let decision = f
            .pipeline
            .route(&transfer(), false, SelectionPolicy::Cheapest)
            .await
            .unwrap();
        assert_eq!(decision.chosen_network_id, "arbitrum");
        assert_eq!(decision.all_estimates.len(), 3);
        assert!(decision.all_estimates[1].error().is_some());
    }

    #[tokio::test]
    async fn test_route_fastest_uses_static_rank() {
        let f = fixture(
            vec![
                FakeClient::new(4, 3_000),
                FakeClient::new(5, 1_900),
                FakeClient::new(5, 3_000),
            ],
            false,
        );
        let decision = f
            .pipeline
            .route(&transfer(), false, SelectionPolicy::Fastest)
            .await
            .unwrap();
        assert_eq!(decision.chosen_network_id, "optimism");
    }

    #[tokio::test]
    async fn test_route_and_send_dispatches_on_winner() {
        let f = fixture(
            vec![
                FakeClient::new(4, 3_000),
                FakeClient::new(5, 1_900),
                FakeClient::new(5, 3_000),
            ],
            true,
        );

        let routed = f
            .pipeline
            .route_and_send(&transfer(), false, SelectionPolicy::Cheapest)
            .await
            .unwrap();

        assert_eq!(routed.decision.chosen_network_id, "optimism");
        assert!(f.clients[0].sent().is_empty());
        assert_eq!(f.clients[1].sent().len(), 1);
        assert!(f.clients[2].sent().is_empty());
        // nonce is read only by the dispatcher, never during estimation
        assert_eq!(f.clients[1].nonce_calls(), 1);
    }

    #[tokio::test]
    async fn test_route_and_send_all_failed() {
        let f = fixture(
            vec![
                FakeClient::unreachable(),
                FakeClient::unreachable(),
                FakeClient::unreachable(),
            ],
            true,
        );

        let err = f
            .pipeline
            .route_and_send(&transfer(), false, SelectionPolicy::Cheapest)
            .await
            .unwrap_err();
        assert_eq!(err, RouterError::NoViableRoute);
    }

    #[tokio::test]
    async fn test_send_without_key() {
        let f = fixture(
            vec![
                FakeClient::new(1, 21_000),
                FakeClient::new(1, 21_000),
                FakeClient::new(1, 21_000),
            ],
            false,
        );

        let err = f.pipeline.send("base", &transfer()).await.unwrap_err();
        assert_eq!(err.kind(), "SigningFailed");
        assert!(f.clients[2].sent().is_empty());
    }
}
