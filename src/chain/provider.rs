//! Chain provider: one RPC client per network with bounded round trips

use super::network::NetworkConfig;
use crate::error::{RouterError, RouterResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

/// Failure of a single RPC call, before it is attributed to a network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Transport(String),

    /// JSON-RPC error object returned by the node
    #[error("{message}")]
    Rpc { code: i64, message: String },

    #[error("{0}")]
    Malformed(String),
}

impl ClientError {
    /// Attribute a failed read (gas price, estimate, nonce) to a network
    pub fn into_query_error(self, network: &str) -> RouterError {
        match self {
            ClientError::Rpc { message, .. } => RouterError::EstimationFailed {
                network: network.to_string(),
                message,
            },
            other => RouterError::NetworkUnreachable {
                network: network.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Attribute a failed broadcast to a network
    pub fn into_broadcast_error(self, network: &str) -> RouterError {
        RouterError::BroadcastFailed {
            network: network.to_string(),
            message: self.to_string(),
        }
    }
}

/// Minimal JSON-RPC surface needed to price and send a value transfer
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn gas_price(&self) -> Result<U256, ClientError>;

    async fn estimate_transfer_gas(
        &self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<U256, ClientError>;

    /// Transaction count at the pending block, i.e. the next usable nonce
    async fn transaction_count(&self, address: Address) -> Result<U256, ClientError>;

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ClientError>;

    async fn block_number(&self) -> Result<u64, ClientError>;
}

/// `ChainClient` backed by an ethers HTTP provider
pub struct EthersClient {
    provider: Provider<Http>,
}

impl EthersClient {
    pub fn new(url: reqwest::Url, connect_timeout: Duration) -> RouterResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| RouterError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            provider: Provider::new(Http::new_with_client(url, client)),
        })
    }
}

#[async_trait]
impl ChainClient for EthersClient {
    async fn gas_price(&self) -> Result<U256, ClientError> {
        self.provider.get_gas_price().await.map_err(classify)
    }

    async fn estimate_transfer_gas(
        &self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<U256, ClientError> {
        let tx: TypedTransaction = TransactionRequest::new()
            .from(from)
            .to(to)
            .value(value)
            .into();

        self.provider.estimate_gas(&tx, None).await.map_err(classify)
    }

    async fn transaction_count(&self, address: Address) -> Result<U256, ClientError> {
        self.provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(classify)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ClientError> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(classify)?;
        Ok(pending.tx_hash())
    }

    async fn block_number(&self) -> Result<u64, ClientError> {
        self.provider
            .get_block_number()
            .await
            .map(|b| b.as_u64())
            .map_err(classify)
    }
}

/// Reduce a provider error to something safe to surface
///
/// Node-reported JSON-RPC errors keep their message. Transport failures are
/// described generically since their text can embed the endpoint URL.
fn classify(err: ProviderError) -> ClientError {
    debug!("RPC call failed: {}", err);

    if let Some(resp) = RpcError::as_error_response(&err) {
        return ClientError::Rpc {
            code: resp.code,
            message: resp.message.clone(),
        };
    }

    if RpcError::as_serde_error(&err).is_some() {
        return ClientError::Malformed("malformed JSON-RPC response".to_string());
    }

    match err {
        ProviderError::HTTPError(e) if e.is_timeout() => {
            ClientError::Transport("request timed out".to_string())
        }
        ProviderError::HTTPError(e) if e.is_connect() => {
            ClientError::Transport("connection failed".to_string())
        }
        ProviderError::HTTPError(e) => match e.status() {
            Some(status) => ClientError::Transport(format!("HTTP status {}", status)),
            None => ClientError::Transport("request failed".to_string()),
        },
        _ => ClientError::Transport("RPC request failed".to_string()),
    }
}

/// A network bound to its client and the per-call RPC timeout
pub struct ChainProvider {
    config: NetworkConfig,
    client: Arc<dyn ChainClient>,
    rpc_timeout: Duration,
}

impl ChainProvider {
    pub fn new(config: NetworkConfig, client: Arc<dyn ChainClient>, rpc_timeout: Duration) -> Self {
        Self {
            config,
            client,
            rpc_timeout,
        }
    }

    /// Connect to the configured endpoint over HTTP
    pub fn connect(config: NetworkConfig, rpc_timeout: Duration) -> RouterResult<Self> {
        let url = config.endpoint_url()?;
        let client = EthersClient::new(url, rpc_timeout)?;
        Ok(Self::new(config, Arc::new(client), rpc_timeout))
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Current legacy gas price in wei
    pub async fn gas_price(&self) -> RouterResult<U256> {
        self.bounded(self.client.gas_price())
            .await
            .map_err(|e| e.into_query_error(self.id()))
    }

    /// Gas units for a plain value transfer
    pub async fn estimate_transfer_gas(
        &self,
        from: Address,
        to: Address,
        value: U256,
    ) -> RouterResult<U256> {
        self.bounded(self.client.estimate_transfer_gas(from, to, value))
            .await
            .map_err(|e| e.into_query_error(self.id()))
    }

    /// Next nonce for `address`, read live from the chain
    pub async fn transaction_count(&self, address: Address) -> RouterResult<U256> {
        self.bounded(self.client.transaction_count(address))
            .await
            .map_err(|e| e.into_query_error(self.id()))
    }

    pub async fn send_raw_transaction(&self, raw: Bytes) -> RouterResult<H256> {
        self.bounded(self.client.send_raw_transaction(raw))
            .await
            .map_err(|e| e.into_broadcast_error(self.id()))
    }

    /// Liveness probe
    pub async fn health_check(&self) -> bool {
        match self.bounded(self.client.block_number()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Health check failed for {}: {}", self.id(), e);
                false
            }
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        match timeout(self.rpc_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.rpc_timeout)),
        }
    }
}

impl std::fmt::Debug for ChainProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainProvider")
            .field("id", &self.config.id)
            .field("chain_id", &self.config.chain_id)
            .field("rpc_timeout", &self.rpc_timeout)
            .finish()
    }
}
