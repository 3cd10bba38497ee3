//! HTTP API for estimation, routing and dispatch

use crate::config::ApiConfig;
use crate::error::{RouterError, RouterResult};
use crate::fees::{FeeEstimate, TransferRequest};
use crate::routing::{RouteDecision, RoutePipeline, SelectionPolicy};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ethers::types::{Address, H256, U256};
use ethers::utils::parse_ether;
use lazy_static::lazy_static;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RoutePipeline>,
}

/// Build the API router
pub fn router(pipeline: Arc<RoutePipeline>) -> Router {
    let state = AppState { pipeline };

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/networks", get(list_networks))
        .route("/estimate", post(estimate))
        .route("/route", post(route))
        .route("/send", post(send))
        .route("/route-and-send", post(route_and_send))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP API server
pub async fn run_server(config: ApiConfig, pipeline: Arc<RoutePipeline>) -> RouterResult<()> {
    let app = router(pipeline);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RouterError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| RouterError::Internal(format!("API server failed: {}", e)))?;

    Ok(())
}

// Request types

/// Wei has 18 decimals below one ether
const ETHER_DECIMALS: usize = 18;

lazy_static! {
    static ref DECIMAL_AMOUNT: Regex = Regex::new(r"^[0-9]+(\.[0-9]+)?$").unwrap();
}

/// Ether amount kept as the decimal text the client sent
///
/// Accepts a JSON number or a numeric string. The literal is never routed
/// through a float.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthAmount(String);

impl<'de> Deserialize<'de> for EthAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        let text = raw.get().trim();
        let literal = text
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text);
        Ok(EthAmount(literal.trim().to_string()))
    }
}

impl EthAmount {
    /// Convert to wei by decimal parsing
    pub fn to_wei(&self) -> RouterResult<U256> {
        let literal = self.0.as_str();
        if !DECIMAL_AMOUNT.is_match(literal) {
            return Err(RouterError::InvalidRequest(format!(
                "amount_eth must be a positive decimal number, got {}",
                literal
            )));
        }

        let decimals = literal.split_once('.').map_or(0, |(_, frac)| frac.len());
        if decimals > ETHER_DECIMALS {
            return Err(RouterError::InvalidRequest(format!(
                "amount_eth {} has more than {} decimals",
                literal, ETHER_DECIMALS
            )));
        }

        let wei = parse_ether(literal).map_err(|_| {
            RouterError::InvalidRequest(format!("amount_eth {} is not representable in wei", literal))
        })?;

        if wei.is_zero() {
            return Err(RouterError::InvalidRequest(
                "amount_eth must be greater than zero".to_string(),
            ));
        }
        Ok(wei)
    }
}

fn default_include_usd() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub from_address: String,
    pub to_address: String,
    pub amount_eth: EthAmount,
    #[serde(default = "default_include_usd")]
    pub include_usd: bool,
    #[serde(default)]
    pub policy: SelectionPolicy,
}

impl EstimateRequest {
    fn transfer(&self) -> RouterResult<TransferRequest> {
        parse_transfer(&self.from_address, &self.to_address, &self.amount_eth)
    }
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub network: String,
    pub from_address: String,
    pub to_address: String,
    pub amount_eth: EthAmount,
}

fn parse_transfer(from: &str, to: &str, amount_eth: &EthAmount) -> RouterResult<TransferRequest> {
    Ok(TransferRequest {
        from: parse_address("from_address", from)?,
        to: parse_address("to_address", to)?,
        amount_wei: amount_eth.to_wei()?,
    })
}

fn parse_address(field: &str, value: &str) -> RouterResult<Address> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| RouterError::InvalidRequest(format!("Invalid {}: {}", field, value)))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError(RouterError::InvalidRequest(rejection.body_text())))
}

// Handlers

/// Health check endpoint - basic liveness
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check - probe every network's RPC endpoint
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.pipeline.registry().health_check().await;
    let ready = health.iter().any(|(_, healthy)| *healthy);

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            networks: health
                .into_iter()
                .map(|(network, healthy)| NetworkHealth { network, healthy })
                .collect(),
        }),
    )
}

async fn list_networks(State(state): State<AppState>) -> impl IntoResponse {
    let networks: Vec<(String, NetworkView)> = state
        .pipeline
        .registry()
        .list_networks()
        .into_iter()
        .map(|n| {
            (
                n.id.clone(),
                NetworkView {
                    chain_id: n.chain_id,
                    rpc_endpoint: n.rpc_endpoint.clone(),
                    native_symbol: n.native_symbol.clone(),
                    latency_rank: n.latency_rank,
                },
            )
        })
        .collect();

    Json(OrderedMap(networks))
}

async fn estimate(
    State(state): State<AppState>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<OrderedMap<EstimateBody>>, ApiError> {
    let request = body(payload)?;
    let transfer = request.transfer()?;

    let estimates = state.pipeline.estimate(&transfer, request.include_usd).await;

    Ok(Json(OrderedMap(
        estimates
            .iter()
            .map(|e| (e.network_id.clone(), EstimateBody::from(e)))
            .collect(),
    )))
}

async fn route(
    State(state): State<AppState>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<RouteResponse>, ApiError> {
    let request = body(payload)?;
    let transfer = request.transfer()?;

    let decision = state
        .pipeline
        .route(&transfer, request.include_usd, request.policy)
        .await?;

    Ok(Json(RouteResponse::from(&decision)))
}

async fn send(
    State(state): State<AppState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, ApiError> {
    let request = body(payload)?;
    let transfer = parse_transfer(&request.from_address, &request.to_address, &request.amount_eth)?;

    let tx_hash = state.pipeline.send(&request.network, &transfer).await?;

    Ok(Json(SendResponse {
        transaction_hash: format_hash(tx_hash),
    }))
}

async fn route_and_send(
    State(state): State<AppState>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> Result<Json<RouteAndSendResponse>, ApiError> {
    let request = body(payload)?;
    let transfer = request.transfer()?;

    let routed = state
        .pipeline
        .route_and_send(&transfer, request.include_usd, request.policy)
        .await?;

    Ok(Json(RouteAndSendResponse {
        chosen_network: routed.decision.chosen_network_id.clone(),
        transaction_hash: format_hash(routed.transaction_hash),
        estimates: entries(&routed.decision.all_estimates),
    }))
}

fn format_hash(hash: H256) -> String {
    format!("{:#x}", hash)
}

fn entries(estimates: &[FeeEstimate]) -> Vec<EstimateEntry> {
    estimates
        .iter()
        .map(|e| EstimateEntry {
            network: e.network_id.clone(),
            body: EstimateBody::from(e),
        })
        .collect()
}

// Error payloads

/// Router error rendered as a structured JSON payload
#[derive(Debug)]
pub struct ApiError(pub RouterError);

impl From<RouterError> for ApiError {
    fn from(err: RouterError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RouterError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RouterError::NetworkNotFound { .. } => StatusCode::NOT_FOUND,
            RouterError::NoViableRoute | RouterError::EstimationFailed { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            RouterError::NetworkUnreachable { .. } | RouterError::BroadcastFailed { .. } => {
                StatusCode::BAD_GATEWAY
            }
            RouterError::SigningFailed(_)
            | RouterError::Config(_)
            | RouterError::PriceFeed(_)
            | RouterError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }

        let payload = ErrorResponse {
            error: ErrorBody {
                kind: self.0.kind(),
                message: self.0.to_string(),
            },
        };

        (status, Json(payload)).into_response()
    }
}

// Response types

/// JSON object that keeps insertion order (registry order)
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    networks: Vec<NetworkHealth>,
}

#[derive(Serialize)]
struct NetworkHealth {
    network: String,
    healthy: bool,
}

#[derive(Serialize)]
pub struct NetworkView {
    chain_id: u64,
    rpc_endpoint: String,
    native_symbol: String,
    latency_rank: u32,
}

/// Either fee fields or `error`, never both
#[derive(Debug, Serialize, Default)]
pub struct EstimateBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_price: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_fee_native: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_fee_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
}

impl From<&FeeEstimate> for EstimateBody {
    fn from(estimate: &FeeEstimate) -> Self {
        match (estimate.fees(), estimate.error()) {
            (Some(fees), _) => Self {
                gas_price: Some(fees.gas_price_wei),
                gas_limit: Some(fees.gas_limit),
                total_fee_native: Some(fees.total_fee_native),
                total_fee_usd: fees.total_fee_usd,
                ..Default::default()
            },
            (None, Some(err)) => Self {
                error: Some(err.to_string()),
                error_kind: Some(err.kind()),
                ..Default::default()
            },
            (None, None) => Self::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EstimateEntry {
    network: String,
    #[serde(flatten)]
    body: EstimateBody,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    chosen_network: String,
    policy: SelectionPolicy,
    estimates: Vec<EstimateEntry>,
}

impl From<&RouteDecision> for RouteResponse {
    fn from(decision: &RouteDecision) -> Self {
        Self {
            chosen_network: decision.chosen_network_id.clone(),
            policy: decision.policy,
            estimates: entries(&decision.all_estimates),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    transaction_hash: String,
}

#[derive(Debug, Serialize)]
pub struct RouteAndSendResponse {
    chosen_network: String,
    transaction_hash: String,
    estimates: Vec<EstimateEntry>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::testing::FakeClient;
    use crate::chain::{ChainClient, ClientError, NetworkConfig, NetworkRegistry};
    use crate::fees::FeeEstimator;
    use crate::tx::{SigningKey, TransactionDispatcher};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const RECIPIENT: &str = "0x2222222222222222222222222222222222222222";

    fn app(clients: Vec<FakeClient>) -> Router {
        let configs = vec![
            NetworkConfig::new("arbitrum", 42161, "http://arb.local", "ETH", 2),
            NetworkConfig::new("optimism", 10, "http://op.local", "ETH", 1),
            NetworkConfig::new("base", 8453, "http://base.local", "ETH", 3),
        ];
        let entries: Vec<(NetworkConfig, Arc<dyn ChainClient>)> = configs
            .into_iter()
            .zip(clients)
            .map(|(c, client)| (c, Arc::new(client) as Arc<dyn ChainClient>))
            .collect();

        let registry =
            Arc::new(NetworkRegistry::from_clients(entries, Duration::from_millis(200)).unwrap());
        let estimator = FeeEstimator::new(registry.clone(), None);
        let dispatcher =
            TransactionDispatcher::new(registry.clone(), SigningKey::parse(DEV_KEY).unwrap());

        router(Arc::new(RoutePipeline::new(registry, estimator, Some(dispatcher))))
    }

    fn healthy_clients() -> Vec<FakeClient> {
        vec![
            FakeClient::new(4, 3_000),
            FakeClient::new(5, 1_900),
            FakeClient::new(5, 3_000),
        ]
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        read(app.oneshot(request).await.unwrap()).await
    }

    async fn get_path(app: Router, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        read(app.oneshot(request).await.unwrap()).await
    }

    async fn read(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn transfer_body() -> Value {
        json!({
            "from_address": DEV_ADDRESS,
            "to_address": RECIPIENT,
            "amount_eth": 0.1,
            "include_usd": false
        })
    }

    fn wei(json: &str) -> RouterResult<U256> {
        serde_json::from_str::<EthAmount>(json).unwrap().to_wei()
    }

    #[test]
    fn test_amount_uses_decimal_literal() {
        assert_eq!(wei("0.1").unwrap(), U256::exp10(17));
        assert_eq!(wei("1.5").unwrap(), U256::from(1_500_000_000_000_000_000u64));
        assert_eq!(wei("\"2\"").unwrap(), U256::from(2) * U256::exp10(18));
        assert_eq!(
            wei("1.000000000000000001").unwrap(),
            U256::from(1_000_000_000_000_000_001u64)
        );
        assert_eq!(wei("0.000000000000000001").unwrap(), U256::one());
    }

    #[test]
    fn test_amount_rejects_non_positive_and_excess_precision() {
        assert!(wei("0").is_err());
        assert!(wei("0.000").is_err());
        assert!(wei("-1").is_err());
        assert!(wei("1e-7").is_err());
        assert!(wei("\"abc\"").is_err());
        assert_eq!(
            wei("0.0000000000000000001").unwrap_err().kind(),
            "InvalidRequest"
        );
    }

    #[test]
    fn test_request_keeps_full_wei_precision() {
        let body = r#"{"from_address":"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "to_address":"0x2222222222222222222222222222222222222222",
            "amount_eth":1.000000000000000001}"#;
        let request: EstimateRequest = serde_json::from_str(body).unwrap();
        assert_eq!(
            request.transfer().unwrap().amount_wei,
            U256::from(1_000_000_000_000_000_001u64)
        );
        assert!(request.include_usd);
        assert_eq!(request.policy, SelectionPolicy::Cheapest);
    }

    #[tokio::test]
    async fn test_networks_in_registry_order() {
        let (status, text) = get_path(app(healthy_clients()), "/networks").await;
        assert_eq!(status, StatusCode::OK);

        let arb = text.find("\"arbitrum\"").unwrap();
        let op = text.find("\"optimism\"").unwrap();
        let base = text.find("\"base\"").unwrap();
        assert!(arb < op && op < base);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["optimism"]["chain_id"], 10);
        assert_eq!(value["base"]["native_symbol"], "ETH");
    }

    #[tokio::test]
    async fn test_estimate_reports_failed_network_inline() {
        let clients = vec![
            FakeClient::new(5, 1_900),
            FakeClient::new(1, 21_000).with_delay(Duration::from_secs(10)),
            FakeClient::new(5, 3_000),
        ];
        let (status, text) = post_json(app(clients), "/estimate", transfer_body()).await;
        assert_eq!(status, StatusCode::OK);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["arbitrum"]["total_fee_native"], 9_500);
        assert_eq!(value["arbitrum"]["gas_price"], 5);
        assert_eq!(value["arbitrum"]["gas_limit"], 1_900);
        assert!(value["arbitrum"].get("error").is_none());
        assert!(value["optimism"]["error"].as_str().unwrap().contains("timed out"));
        assert!(value["optimism"].get("total_fee_native").is_none());
        assert_eq!(value["base"]["total_fee_native"], 15_000);
    }

    #[tokio::test]
    async fn test_route_picks_cheapest() {
        let (status, text) = post_json(app(healthy_clients()), "/route", transfer_body()).await;
        assert_eq!(status, StatusCode::OK);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["chosen_network"], "optimism");
        assert_eq!(value["policy"], "cheapest");
        let estimates = value["estimates"].as_array().unwrap();
        assert_eq!(estimates.len(), 3);
        assert_eq!(estimates[0]["network"], "arbitrum");
    }

    #[tokio::test]
    async fn test_route_fastest_policy() {
        let mut body = transfer_body();
        body["policy"] = json!("fastest");
        let clients = vec![
            FakeClient::new(1, 21_000),
            FakeClient::new(9, 21_000),
            FakeClient::new(1, 21_000),
        ];
        let (_, text) = post_json(app(clients), "/route", body).await;
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["chosen_network"], "optimism");
    }

    #[tokio::test]
    async fn test_route_with_no_viable_network() {
        let clients = vec![
            FakeClient::unreachable(),
            FakeClient::unreachable(),
            FakeClient::unreachable(),
        ];
        let (status, text) = post_json(app(clients), "/route", transfer_body()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["error"]["kind"], "NoViableRoute");
        assert!(value.get("chosen_network").is_none());
    }

    #[tokio::test]
    async fn test_send_returns_hash() {
        let body = json!({
            "network": "base",
            "from_address": DEV_ADDRESS,
            "to_address": RECIPIENT,
            "amount_eth": 0.01
        });
        let (status, text) = post_json(app(healthy_clients()), "/send", body).await;
        assert_eq!(status, StatusCode::OK);

        let value: Value = serde_json::from_str(&text).unwrap();
        let hash = value["transaction_hash"].as_str().unwrap();
        assert!(hash.starts_with("0x"));
        assert_eq!(hash.len(), 66);
    }

    #[tokio::test]
    async fn test_send_with_stale_nonce() {
        let clients = vec![
            FakeClient::new(1, 21_000),
            FakeClient::new(1, 21_000).failing_send(ClientError::Rpc {
                code: -32000,
                message: "nonce too low".into(),
            }),
            FakeClient::new(1, 21_000),
        ];
        let body = json!({
            "network": "optimism",
            "from_address": DEV_ADDRESS,
            "to_address": RECIPIENT,
            "amount_eth": 0.01
        });
        let (status, text) = post_json(app(clients), "/send", body).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["error"]["kind"], "BroadcastFailed");
        assert!(value["error"]["message"].as_str().unwrap().contains("nonce too low"));
        assert!(value.get("transaction_hash").is_none());
        assert!(!text.contains(DEV_KEY));
    }

    #[tokio::test]
    async fn test_send_unknown_network() {
        let body = json!({
            "network": "polygon",
            "from_address": DEV_ADDRESS,
            "to_address": RECIPIENT,
            "amount_eth": 0.01
        });
        let (status, text) = post_json(app(healthy_clients()), "/send", body).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(text.contains("NetworkNotFound"));
    }

    #[tokio::test]
    async fn test_route_and_send() {
        let (status, text) =
            post_json(app(healthy_clients()), "/route-and-send", transfer_body()).await;
        assert_eq!(status, StatusCode::OK);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["chosen_network"], "optimism");
        assert!(value["transaction_hash"].as_str().unwrap().starts_with("0x"));
        assert_eq!(value["estimates"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_inputs_rejected() {
        let mut body = transfer_body();
        body["to_address"] = json!("not-an-address");
        let (status, text) = post_json(app(healthy_clients()), "/estimate", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(text.contains("InvalidRequest"));

        let mut body = transfer_body();
        body["amount_eth"] = json!(-2);
        let (status, _) = post_json(app(healthy_clients()), "/route", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, text) =
            post_json(app(healthy_clients()), "/estimate", json!({ "amount_eth": 1 })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(text.contains("InvalidRequest"));
    }

    #[tokio::test]
    async fn test_readiness_reports_networks() {
        let clients = vec![
            FakeClient::new(1, 21_000),
            FakeClient::unreachable(),
            FakeClient::new(1, 21_000),
        ];
        let (status, text) = get_path(app(clients), "/ready").await;
        assert_eq!(status, StatusCode::OK);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["networks"][1]["network"], "optimism");
        assert_eq!(value["networks"][1]["healthy"], false);
    }
}
