//! L2 Router - gas-optimized Ether transfers across Layer-2 networks
//!
//! Estimates the fee of a transfer on every registered network concurrently,
//! picks a route by policy, and signs and broadcasts the transfer there.

use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod api;
mod chain;
mod config;
mod error;
mod fees;
mod metrics;
mod routing;
mod tx;

use chain::NetworkRegistry;
use config::Settings;
use fees::{CoinGeckoSource, FeeEstimator, PriceConverter};
use metrics::MetricsServer;
use routing::RoutePipeline;
use tx::{SigningKey, TransactionDispatcher};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    init_logging();

    info!("Starting L2 Router v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;

    // Build the network registry (validated, not contacted)
    let registry = Arc::new(NetworkRegistry::from_settings(&settings, |name| {
        std::env::var(name).ok()
    })?);
    info!("Registered {} networks", registry.len());

    // Price conversion is optional
    let prices = if settings.price_feed.enabled {
        let source = CoinGeckoSource::new(
            settings.price_feed.base_url.clone(),
            settings.price_feed.timeout(),
        )?;
        Some(Arc::new(PriceConverter::new(
            Arc::new(source),
            settings.price_feed.cache_ttl(),
            settings.price_feed.timeout(),
        )))
    } else {
        info!("Price feed disabled, USD conversion unavailable");
        None
    };

    // Dispatch needs a signing key; estimation and routing do not
    let dispatcher = match SigningKey::from_env(&settings.wallet.private_key_env)? {
        Some(key) => Some(TransactionDispatcher::new(registry.clone(), key)),
        None => {
            warn!(
                "{} not set, send operations will be rejected",
                settings.wallet.private_key_env
            );
            None
        }
    };

    let estimator = FeeEstimator::new(registry.clone(), prices);
    let pipeline = Arc::new(RoutePipeline::new(registry.clone(), estimator, dispatcher));

    // Start metrics server
    let metrics_handle = if settings.metrics.enabled {
        let server = MetricsServer::new(settings.metrics.port);
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    // Start API server
    let api_handle = tokio::spawn({
        let api_config = settings.api.clone();
        let pipeline = pipeline.clone();
        async move {
            if let Err(e) = api::run_server(api_config, pipeline).await {
                error!("API server error: {}", e);
            }
        }
    });

    // Initial reachability probe
    for (network, healthy) in registry.health_check().await {
        if !healthy {
            warn!("Network {} is not reachable at startup", network);
        }
    }

    info!("L2 Router is running");
    info!("API server: http://{}:{}", settings.api.host, settings.api.port);
    if settings.metrics.enabled {
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
    }

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");

    api_handle.abort();
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("L2 Router stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,l2_router=debug,hyper=warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
