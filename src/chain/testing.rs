//! Scriptable in-memory `ChainClient` for tests

use super::provider::{ChainClient, ClientError};

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub struct FakeClient {
    gas_price: Result<U256, ClientError>,
    gas_limit: Result<U256, ClientError>,
    send_error: Option<ClientError>,
    delay: Duration,
    nonce: AtomicU64,
    nonce_calls: AtomicUsize,
    sent: Mutex<Vec<Bytes>>,
}

impl FakeClient {
    pub fn new(gas_price: u64, gas_limit: u64) -> Self {
        Self {
            gas_price: Ok(U256::from(gas_price)),
            gas_limit: Ok(U256::from(gas_limit)),
            send_error: None,
            delay: Duration::ZERO,
            nonce: AtomicU64::new(0),
            nonce_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if the endpoint refused the connection
    pub fn unreachable() -> Self {
        let refused = ClientError::Transport("connection failed".to_string());
        Self {
            gas_price: Err(refused.clone()),
            gas_limit: Err(refused.clone()),
            send_error: Some(refused),
            ..Self::new(0, 0)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_nonce(self, nonce: u64) -> Self {
        self.nonce.store(nonce, Ordering::SeqCst);
        self
    }

    pub fn failing_estimate(mut self, err: ClientError) -> Self {
        self.gas_limit = Err(err);
        self
    }

    pub fn failing_send(mut self, err: ClientError) -> Self {
        self.send_error = Some(err);
        self
    }

    /// Simulate other activity on the account between two sends
    pub fn advance_nonce(&self) {
        self.nonce.fetch_add(1, Ordering::SeqCst);
    }

    pub fn nonce_calls(&self) -> usize {
        self.nonce_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl ChainClient for FakeClient {
    async fn gas_price(&self) -> Result<U256, ClientError> {
        self.pause().await;
        self.gas_price.clone()
    }

    async fn estimate_transfer_gas(
        &self,
        _from: Address,
        _to: Address,
        _value: U256,
    ) -> Result<U256, ClientError> {
        self.pause().await;
        self.gas_limit.clone()
    }

    async fn transaction_count(&self, _address: Address) -> Result<U256, ClientError> {
        self.pause().await;
        self.nonce_calls.fetch_add(1, Ordering::SeqCst);
        match &self.gas_price {
            Ok(_) => Ok(U256::from(self.nonce.load(Ordering::SeqCst))),
            Err(e) => Err(e.clone()),
        }
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256, ClientError> {
        self.pause().await;
        if let Some(ref err) = self.send_error {
            return Err(err.clone());
        }
        let hash = H256::from(keccak256(&raw));
        self.sent.lock().unwrap().push(raw);
        Ok(hash)
    }

    async fn block_number(&self) -> Result<u64, ClientError> {
        self.pause().await;
        match &self.gas_price {
            Ok(_) => Ok(1),
            Err(e) => Err(e.clone()),
        }
    }
}
