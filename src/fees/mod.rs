//! Fee estimation across all registered networks
//!
//! Each network yields exactly one [`FeeEstimate`], successful or failed, in
//! registry order. Fiat annotation is best effort and never fails an estimate.

pub mod estimator;
pub mod price;

pub use estimator::FeeEstimator;
pub use price::{CoinGeckoSource, PriceConverter};

use crate::error::RouterError;

use ethers::types::{Address, U256};

/// A value transfer to price or send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: Address,
    pub to: Address,
    pub amount_wei: U256,
}

/// Fee figures for a successful estimate
#[derive(Debug, Clone, PartialEq)]
pub struct Fees {
    pub gas_price_wei: u128,
    pub gas_limit: u64,
    /// `gas_price_wei * gas_limit`, in wei
    pub total_fee_native: u128,
    /// Present only when the price feed answered
    pub total_fee_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EstimateOutcome {
    Success(Fees),
    Failure(RouterError),
}

/// Result of estimating one transfer on one network
#[derive(Debug, Clone, PartialEq)]
pub struct FeeEstimate {
    pub network_id: String,
    pub outcome: EstimateOutcome,
}

impl FeeEstimate {
    pub fn success(network_id: impl Into<String>, fees: Fees) -> Self {
        Self {
            network_id: network_id.into(),
            outcome: EstimateOutcome::Success(fees),
        }
    }

    pub fn failure(network_id: impl Into<String>, error: RouterError) -> Self {
        Self {
            network_id: network_id.into(),
            outcome: EstimateOutcome::Failure(error),
        }
    }

    pub fn fees(&self) -> Option<&Fees> {
        match &self.outcome {
            EstimateOutcome::Success(fees) => Some(fees),
            EstimateOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RouterError> {
        match &self.outcome {
            EstimateOutcome::Success(_) => None,
            EstimateOutcome::Failure(e) => Some(e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.fees().is_some()
    }
}
