//! Error types for the L2 router

use thiserror::Error;

/// Main error type for the router
///
/// Variants only carry strings so a failure can be stored inside a
/// [`FeeEstimate`](crate::fees::FeeEstimate) and cloned into responses.
/// Messages never contain key material or raw RPC bodies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network {network} not found")]
    NetworkNotFound { network: String },

    #[error("Network {network} unreachable: {message}")]
    NetworkUnreachable { network: String, message: String },

    #[error("Gas estimation failed on {network}: {message}")]
    EstimationFailed { network: String, message: String },

    #[error("No viable route: every network failed estimation")]
    NoViableRoute,

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Broadcast failed on {network}: {message}")]
    BroadcastFailed { network: String, message: String },

    #[error("Price feed error: {0}")]
    PriceFeed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RouterError {
    /// Stable kind identifier exposed in error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            RouterError::Config(_) => "Config",
            RouterError::InvalidRequest(_) => "InvalidRequest",
            RouterError::NetworkNotFound { .. } => "NetworkNotFound",
            RouterError::NetworkUnreachable { .. } => "NetworkUnreachable",
            RouterError::EstimationFailed { .. } => "EstimationFailed",
            RouterError::NoViableRoute => "NoViableRoute",
            RouterError::SigningFailed(_) => "SigningFailed",
            RouterError::BroadcastFailed { .. } => "BroadcastFailed",
            RouterError::PriceFeed(_) => "PriceFeed",
            RouterError::Internal(_) => "Internal",
        }
    }

    /// Check if error is confined to a single network during estimation
    pub fn is_per_network(&self) -> bool {
        matches!(
            self,
            RouterError::NetworkUnreachable { .. } | RouterError::EstimationFailed { .. }
        )
    }
}

/// Result type for router operations
pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable() {
        assert_eq!(RouterError::NoViableRoute.kind(), "NoViableRoute");
        assert_eq!(
            RouterError::BroadcastFailed {
                network: "base".into(),
                message: "nonce too low".into(),
            }
            .kind(),
            "BroadcastFailed"
        );
    }

    #[test]
    fn test_per_network_classification() {
        let unreachable = RouterError::NetworkUnreachable {
            network: "optimism".into(),
            message: "request timed out".into(),
        };
        assert!(unreachable.is_per_network());
        assert!(!RouterError::NoViableRoute.is_per_network());
        assert!(!RouterError::SigningFailed("bad key".into()).is_per_network());
    }
}
