//! Native-token to USD conversion with a short-lived in-process cache

use crate::error::{RouterError, RouterResult};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ethers::types::U256;
use ethers::utils::format_ether;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

/// External reference-price source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// USD price of one unit of `symbol`
    async fn usd_price(&self, symbol: &str) -> RouterResult<f64>;
}

/// CoinGecko `simple/price` client
pub struct CoinGeckoSource {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoSource {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> RouterResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("l2-router/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RouterError::Config(format!("Failed to build price feed client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn coin_id(symbol: &str) -> Option<&'static str> {
        match symbol {
            "ETH" => Some("ethereum"),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CoinGeckoQuote {
    usd: f64,
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn usd_price(&self, symbol: &str) -> RouterResult<f64> {
        let coin_id = Self::coin_id(symbol)
            .ok_or_else(|| RouterError::PriceFeed(format!("Unsupported symbol {}", symbol)))?;

        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url, coin_id
        );
        debug!("Fetching {} price from CoinGecko", symbol);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RouterError::PriceFeed(format!("request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            return Err(RouterError::PriceFeed(format!(
                "CoinGecko API error: {}",
                response.status()
            )));
        }

        let data: HashMap<String, CoinGeckoQuote> = response
            .json()
            .await
            .map_err(|_| RouterError::PriceFeed("malformed CoinGecko response".to_string()))?;

        data.get(coin_id)
            .map(|q| q.usd)
            .ok_or_else(|| RouterError::PriceFeed(format!("Price not found for {}", coin_id)))
    }
}

type PriceFetch = Shared<BoxFuture<'static, RouterResult<f64>>>;

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    usd: f64,
    fetched_at: Instant,
}

enum PriceSlot {
    Cached(CachedPrice),
    /// Upstream lookup in flight; every caller awaits the same future
    Pending(PriceFetch),
}

/// Read-through price cache in front of a [`PriceSource`]
///
/// At most one upstream lookup runs per symbol. Concurrent callers share its
/// outcome, success or failure, so a hanging feed costs one `call_timeout`
/// per request rather than one per network. Failures are not cached.
pub struct PriceConverter {
    source: Arc<dyn PriceSource>,
    cache: DashMap<String, PriceSlot>,
    ttl: Duration,
    call_timeout: Duration,
}

impl PriceConverter {
    pub fn new(source: Arc<dyn PriceSource>, ttl: Duration, call_timeout: Duration) -> Self {
        Self {
            source,
            cache: DashMap::new(),
            ttl,
            call_timeout,
        }
    }

    /// Convert a wei amount of `symbol` to USD
    pub async fn to_usd(&self, amount_wei: u128, symbol: &str) -> RouterResult<f64> {
        let price = self.usd_price(symbol).await?;

        let native: f64 = format_ether(U256::from(amount_wei))
            .parse()
            .map_err(|_| RouterError::Internal("unparseable ether amount".to_string()))?;

        Ok(native * price)
    }

    /// USD price for `symbol`, served from cache while fresh
    pub async fn usd_price(&self, symbol: &str) -> RouterResult<f64> {
        let key = symbol.to_uppercase();

        let fetch = match self.cache.entry(key.clone()) {
            Entry::Occupied(mut slot) => {
                let joined = match slot.get() {
                    PriceSlot::Cached(cached) if self.is_fresh(cached) => {
                        crate::metrics::record_price_cache(true);
                        return Ok(cached.usd);
                    }
                    PriceSlot::Pending(fetch) => Some(fetch.clone()),
                    PriceSlot::Cached(_) => None,
                };
                match joined {
                    Some(fetch) => fetch,
                    None => {
                        let fetch = self.start_fetch(&key);
                        slot.insert(PriceSlot::Pending(fetch.clone()));
                        fetch
                    }
                }
            }
            Entry::Vacant(slot) => {
                let fetch = self.start_fetch(&key);
                slot.insert(PriceSlot::Pending(fetch.clone()));
                fetch
            }
        };

        let result = fetch.clone().await;
        self.settle(&key, &fetch, &result);
        result
    }

    fn start_fetch(&self, symbol: &str) -> PriceFetch {
        crate::metrics::record_price_cache(false);

        let source = self.source.clone();
        let symbol = symbol.to_string();
        let call_timeout = self.call_timeout;

        async move {
            match timeout(call_timeout, source.usd_price(&symbol)).await {
                Ok(Ok(usd)) => Ok(usd),
                Ok(Err(e)) => {
                    warn!("Price lookup for {} failed: {}", symbol, e);
                    Err(e)
                }
                Err(_) => {
                    warn!("Price lookup for {} timed out", symbol);
                    Err(RouterError::PriceFeed(format!(
                        "timed out after {:?}",
                        call_timeout
                    )))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Replace the pending slot with the outcome, unless a newer lookup took it
    fn settle(&self, key: &str, fetch: &PriceFetch, result: &RouterResult<f64>) {
        let Some(mut slot) = self.cache.get_mut(key) else {
            return;
        };
        let current = matches!(&*slot, PriceSlot::Pending(pending) if pending.ptr_eq(fetch));
        if !current {
            return;
        }

        match result {
            Ok(usd) => {
                *slot = PriceSlot::Cached(CachedPrice {
                    usd: *usd,
                    fetched_at: Instant::now(),
                });
            }
            Err(_) => {
                drop(slot);
                self.cache
                    .remove_if(key, |_, s| matches!(s, PriceSlot::Pending(p) if p.ptr_eq(fetch)));
            }
        }
    }

    fn is_fresh(&self, cached: &CachedPrice) -> bool {
        cached.fetched_at.elapsed() < self.ttl
    }
}
