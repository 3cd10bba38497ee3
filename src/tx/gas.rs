//! Gas quoting for plain value transfers

use crate::chain::ChainProvider;
use crate::error::{RouterError, RouterResult};

use ethers::types::{Address, U256};
use tracing::debug;

/// Gas price and gas limit for one transfer on one network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasQuote {
    pub gas_price_wei: u128,
    pub gas_limit: u64,
}

impl GasQuote {
    /// Total fee in wei, `gas_price_wei * gas_limit`
    pub fn total_fee_wei(&self) -> Option<u128> {
        self.gas_price_wei.checked_mul(u128::from(self.gas_limit))
    }
}

/// Fetch gas price and estimate gas usage concurrently
///
/// Always reads fresh values; callers never reuse a quote across sends.
pub async fn quote_transfer(
    provider: &ChainProvider,
    from: Address,
    to: Address,
    value: U256,
) -> RouterResult<GasQuote> {
    let (price, limit) = tokio::join!(
        provider.gas_price(),
        provider.estimate_transfer_gas(from, to, value)
    );

    let quote = GasQuote {
        gas_price_wei: narrow_u128(provider.id(), "gas price", price?)?,
        gas_limit: narrow_u64(provider.id(), "gas limit", limit?)?,
    };

    debug!("Gas quote for {}: {:?}", provider.id(), quote);
    Ok(quote)
}

fn narrow_u128(network: &str, what: &str, value: U256) -> RouterResult<u128> {
    if value > U256::from(u128::MAX) {
        return Err(RouterError::EstimationFailed {
            network: network.to_string(),
            message: format!("{} out of range", what),
        });
    }
    Ok(value.as_u128())
}

fn narrow_u64(network: &str, what: &str, value: U256) -> RouterResult<u64> {
    if value > U256::from(u64::MAX) {
        return Err(RouterError::EstimationFailed {
            network: network.to_string(),
            message: format!("{} out of range", what),
        });
    }
    Ok(value.as_u64())
}
