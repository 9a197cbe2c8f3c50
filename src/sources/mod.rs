//! Exchange connectivity: one `ExchangeClient` trait with an adapter per
//! futures exchange, the registry that picks one by name, and the Bybit
//! ticker websocket that feeds live prices.

pub mod binance;
pub mod bitget;
pub mod bybit;
pub mod bybit_ws;
pub mod gate;
pub mod http;

pub use binance::BinanceClient;
pub use bitget::BitgetClient;
pub use bybit::BybitClient;
pub use bybit_ws::BybitTickerWs;
pub use gate::GateClient;
pub use http::HttpFetcher;

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

use crate::error::{AppError, Result, SignalError};
use crate::services::PairsCache;
use crate::types::{Candle, Exchange, Timeframe};

/// Normalise a user-supplied symbol to the `BASEUSDT` form.
///
/// Trims, uppercases, drops `-`, `/` and `_` separators and appends `USDT`
/// when missing.
pub fn normalize_symbol(symbol: &str) -> String {
    let mut s: String = symbol
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| !matches!(c, '-' | '/' | '_'))
        .collect();
    if !s.ends_with("USDT") {
        s.push_str("USDT");
    }
    s
}

/// Market data capability of one exchange.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Which exchange this client talks to.
    fn exchange(&self) -> Exchange;

    /// Exchange-native form of `symbol`.
    fn normalize_symbol(&self, symbol: &str) -> String {
        normalize_symbol(symbol)
    }

    /// Whether candles can be served at `timeframe`.
    fn supports_timeframe(&self, _timeframe: Timeframe) -> bool {
        true
    }

    /// Candles ascending by open time, at most `limit` of them.
    async fn fetch_ohlc(&self, symbol: &str, timeframe: Timeframe, limit: usize)
        -> Result<Vec<Candle>>;

    /// Tradable USDT perpetual symbols, served from cache unless `force_refresh`.
    async fn get_all_pairs(&self, force_refresh: bool) -> Result<Vec<String>>;

    /// Last traded price from the REST ticker.
    async fn last_price(&self, symbol: &str) -> Result<Option<f64>>;

    /// Whether `symbol` is listed. A cache miss triggers one forced refresh.
    async fn pair_exists(&self, symbol: &str) -> Result<bool> {
        let symbol = self.normalize_symbol(symbol);
        if self.get_all_pairs(false).await?.contains(&symbol) {
            return Ok(true);
        }
        Ok(self.get_all_pairs(true).await?.contains(&symbol))
    }
}

/// Error for a timeframe an exchange cannot serve.
pub(crate) fn unsupported_timeframe(exchange: Exchange, timeframe: Timeframe) -> AppError {
    SignalError::InvalidTimeframe(format!("{} is not supported on {}", timeframe, exchange.label()))
        .into()
}

/// Serve pairs from `cache`, fetching when missing, expired or forced.
///
/// A failed fetch falls back to whatever the cache still holds.
pub(crate) async fn cached_pairs<F, Fut>(
    cache: &PairsCache,
    exchange: Exchange,
    force_refresh: bool,
    fetch: F,
) -> Result<Vec<String>>
where
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<Vec<String>>> + Send,
{
    if !force_refresh {
        if let Some(pairs) = cache.get(exchange) {
            return Ok(pairs);
        }
    }

    match fetch().await {
        Ok(pairs) if !pairs.is_empty() => {
            cache.set(exchange, &pairs);
            Ok(pairs)
        }
        Ok(_) => {
            warn!("{} returned no pairs, using cached list", exchange);
            Ok(cache.get_stale(exchange).unwrap_or_default())
        }
        Err(e) => match cache.get_stale(exchange) {
            Some(pairs) => {
                warn!("Failed to refresh {} pairs ({}), using stale cache", exchange, e);
                Ok(pairs)
            }
            None => Err(e),
        },
    }
}

/// Clients keyed by exchange, with a default for unknown names.
#[derive(Clone)]
pub struct ExchangeRegistry {
    clients: HashMap<Exchange, Arc<dyn ExchangeClient>>,
    default: Exchange,
}

impl ExchangeRegistry {
    pub fn new(default: Exchange) -> Self {
        Self {
            clients: HashMap::new(),
            default,
        }
    }

    /// Register a client under its own exchange.
    pub fn register(mut self, client: Arc<dyn ExchangeClient>) -> Self {
        self.clients.insert(client.exchange(), client);
        self
    }

    /// Registry with all four adapters sharing one fetcher and pair cache.
    pub fn with_all(default: Exchange, http: HttpFetcher, pairs: Arc<PairsCache>) -> Self {
        Self::new(default)
            .register(Arc::new(BinanceClient::new(http.clone(), pairs.clone())))
            .register(Arc::new(BybitClient::new(http.clone(), pairs.clone())))
            .register(Arc::new(BitgetClient::new(http.clone(), pairs.clone())))
            .register(Arc::new(GateClient::new(http, pairs)))
    }

    pub fn default_exchange(&self) -> Exchange {
        self.default
    }

    /// Resolve an exchange name. Missing names use the default; unknown
    /// names fall back to it with a warning.
    pub fn resolve(&self, name: Option<&str>) -> Exchange {
        match name {
            None => self.default,
            Some(n) if n.trim().is_empty() => self.default,
            Some(n) => Exchange::from_str(n).unwrap_or_else(|| {
                warn!("Unknown exchange '{}', using {}", n, self.default);
                self.default
            }),
        }
    }

    pub fn get(&self, exchange: Exchange) -> Result<Arc<dyn ExchangeClient>> {
        self.clients
            .get(&exchange)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Exchange {} is not configured", exchange)))
    }
}
