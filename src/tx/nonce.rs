//! Nonce lookup for outgoing transfers
//!
//! No local nonce tracking: every send reads the pending transaction count
//! from the target chain, so two sends never share a cached value.

use crate::chain::ChainProvider;
use crate::error::{RouterError, RouterResult};

use ethers::types::{Address, U256};
use tracing::debug;

/// Fetch the next nonce for `address` on the provider's network
pub async fn fetch_nonce(provider: &ChainProvider, address: Address) -> RouterResult<U256> {
    let nonce = provider.transaction_count(address).await?;

    if nonce > U256::from(u64::MAX) {
        return Err(RouterError::EstimationFailed {
            network: provider.id().to_string(),
            message: "nonce out of range".to_string(),
        });
    }

    debug!("Fetched nonce {} for {:?} on {}", nonce, address, provider.id());
    Ok(nonce)
}
