//! Transaction dispatcher: build, sign and broadcast Ether transfers

use super::gas::{self, GasQuote};
use super::nonce;
use crate::chain::NetworkRegistry;
use crate::error::{RouterError, RouterResult};

use ethers::prelude::*;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::keccak256;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Signing key held in memory for the lifetime of the process
///
/// Neither `Debug` nor any error produced here reveals the key.
#[derive(Clone)]
pub struct SigningKey {
    wallet: LocalWallet,
}

impl SigningKey {
    /// Parse a hex private key, with or without `0x`
    pub fn parse(raw: &str) -> RouterResult<Self> {
        let trimmed = raw.trim();
        let hex_key = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        hex_key
            .parse::<LocalWallet>()
            .map(|wallet| Self { wallet })
            .map_err(|_| RouterError::SigningFailed("malformed signing key".to_string()))
    }

    /// Load from the named environment variable, if set
    pub fn from_env(var_name: &str) -> RouterResult<Option<Self>> {
        match std::env::var(var_name) {
            Ok(raw) if !raw.trim().is_empty() => Self::parse(&raw).map(Some),
            _ => Ok(None),
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("address", &self.wallet.address())
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Fully specified transfer, ready to sign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransfer {
    pub network_id: String,
    pub from: Address,
    pub to: Address,
    pub amount_wei: U256,
    pub nonce: U256,
    pub gas: GasQuote,
    pub chain_id: u64,
}

impl UnsignedTransfer {
    /// EIP-155 legacy transaction carrying the chain id
    pub fn to_typed(&self) -> TypedTransaction {
        let tx = TransactionRequest::new()
            .from(self.from)
            .to(self.to)
            .value(self.amount_wei)
            .nonce(self.nonce)
            .gas(self.gas.gas_limit)
            .gas_price(self.gas.gas_price_wei)
            .chain_id(self.chain_id);

        TypedTransaction::Legacy(tx)
    }
}

/// Signed payload plus its locally computed hash
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub raw: Bytes,
    pub transaction_hash: H256,
}

/// Builds, signs and broadcasts transfers on registered networks
pub struct TransactionDispatcher {
    registry: Arc<NetworkRegistry>,
    key: SigningKey,
}

impl TransactionDispatcher {
    pub fn new(registry: Arc<NetworkRegistry>, key: SigningKey) -> Self {
        info!("Transaction dispatcher initialized for {:?}", key.address());
        Self { registry, key }
    }

    /// Send `amount_wei` from `from` to `to` on `network_id`
    ///
    /// Nonce and gas parameters are read from the chain at call time.
    pub async fn send(
        &self,
        network_id: &str,
        from: Address,
        to: Address,
        amount_wei: U256,
    ) -> RouterResult<H256> {
        let provider = self.registry.client_for(network_id)?;

        if from != self.key.address() {
            return Err(RouterError::InvalidRequest(
                "from_address does not match the configured signing key".to_string(),
            ));
        }

        let (nonce, quote) = tokio::join!(
            nonce::fetch_nonce(&provider, from),
            gas::quote_transfer(&provider, from, to, amount_wei)
        );

        let request = UnsignedTransfer {
            network_id: network_id.to_string(),
            from,
            to,
            amount_wei,
            nonce: nonce?,
            gas: quote?,
            chain_id: provider.chain_id(),
        };

        let signed = self.sign(&request).await?;

        let result = provider.send_raw_transaction(signed.raw).await;
        match result {
            Ok(tx_hash) => {
                if tx_hash != signed.transaction_hash {
                    warn!(
                        "Node returned hash {:?} for {} but signed payload hashes to {:?}",
                        tx_hash, network_id, signed.transaction_hash
                    );
                }
                info!(
                    "Transaction sent on {}: {:?} (nonce {})",
                    network_id, tx_hash, request.nonce
                );
                crate::metrics::record_tx_sent(network_id);
                Ok(tx_hash)
            }
            Err(e) => {
                warn!("Broadcast failed on {}: {}", network_id, e);
                crate::metrics::record_tx_failed(network_id);
                Err(e)
            }
        }
    }

    /// Sign a transfer with the configured key bound to its chain id
    pub async fn sign(&self, request: &UnsignedTransfer) -> RouterResult<SignedTransaction> {
        let tx = request.to_typed();
        let wallet = self.key.wallet.clone().with_chain_id(request.chain_id);

        let signature = wallet.sign_transaction(&tx).await.map_err(|_| {
            RouterError::SigningFailed(format!("could not sign transfer on {}", request.network_id))
        })?;

        let raw = tx.rlp_signed(&signature);
        let transaction_hash = H256::from(keccak256(&raw));

        Ok(SignedTransaction {
            raw,
            transaction_hash,
        })
    }
}
