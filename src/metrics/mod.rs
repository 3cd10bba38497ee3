//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Per-network estimation outcomes and latency
//! - Route selections
//! - Transaction dispatch
//! - Price cache efficiency

use crate::error::{RouterError, RouterResult};

use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, register_int_counter,
    CounterVec, Encoder, GaugeVec, HistogramVec, IntCounter, TextEncoder,
};
use std::net::SocketAddr;
use tracing::info;

lazy_static! {
    // Network metrics
    pub static ref NETWORK_UP: GaugeVec = register_gauge_vec!(
        "l2_router_network_up",
        "Network RPC reachability (1=reachable, 0=unreachable)",
        &["network"]
    ).unwrap();

    // Estimation metrics
    pub static ref ESTIMATES: CounterVec = register_counter_vec!(
        "l2_router_estimates_total",
        "Total per-network fee estimates by outcome",
        &["network", "outcome"]
    ).unwrap();

    pub static ref ESTIMATE_LATENCY: HistogramVec = register_histogram_vec!(
        "l2_router_estimate_latency_seconds",
        "Per-network fee estimation latency",
        &["network"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    // Routing metrics
    pub static ref ROUTES_SELECTED: CounterVec = register_counter_vec!(
        "l2_router_routes_selected_total",
        "Total routes selected by network and policy",
        &["network", "policy"]
    ).unwrap();

    pub static ref NO_VIABLE_ROUTE: IntCounter = register_int_counter!(
        "l2_router_no_viable_route_total",
        "Total selections where every network failed"
    ).unwrap();

    // Transaction metrics
    pub static ref TX_SENT: CounterVec = register_counter_vec!(
        "l2_router_transactions_sent_total",
        "Total transactions broadcast",
        &["network"]
    ).unwrap();

    pub static ref TX_FAILED: CounterVec = register_counter_vec!(
        "l2_router_transactions_failed_total",
        "Total transactions rejected at broadcast",
        &["network"]
    ).unwrap();

    // Price feed metrics
    pub static ref PRICE_CACHE: CounterVec = register_counter_vec!(
        "l2_router_price_cache_lookups_total",
        "Price cache lookups by result",
        &["result"]
    ).unwrap();
}

/// Prometheus metrics server
pub struct MetricsServer {
    port: u16,
}

impl MetricsServer {
    pub fn new(port: u16) -> Self {
        Self { port }
    }

    pub async fn run(&self) -> RouterResult<()> {
        let app = Router::new().route("/metrics", get(metrics_handler));

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Starting metrics server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RouterError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| RouterError::Internal(format!("Metrics server failed: {}", e)))?;

        Ok(())
    }
}

async fn metrics_handler() -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

// Helper functions to record metrics

pub fn record_network_health(network: &str, healthy: bool) {
    NETWORK_UP
        .with_label_values(&[network])
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_estimate(network: &str, success: bool, latency_secs: f64) {
    let outcome = if success { "success" } else { "failure" };
    ESTIMATES.with_label_values(&[network, outcome]).inc();
    ESTIMATE_LATENCY
        .with_label_values(&[network])
        .observe(latency_secs);
}

pub fn record_route_selected(network: &str, policy: &str) {
    ROUTES_SELECTED.with_label_values(&[network, policy]).inc();
}

pub fn record_no_viable_route() {
    NO_VIABLE_ROUTE.inc();
}

pub fn record_tx_sent(network: &str) {
    TX_SENT.with_label_values(&[network]).inc();
}

pub fn record_tx_failed(network: &str) {
    TX_FAILED.with_label_values(&[network]).inc();
}

pub fn record_price_cache(hit: bool) {
    PRICE_CACHE
        .with_label_values(&[if hit { "hit" } else { "miss" }])
        .inc();
}
