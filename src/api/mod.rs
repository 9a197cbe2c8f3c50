pub mod health;
pub mod market;
pub mod signals;

use crate::AppState;
use axum::Router;
use serde::Serialize;

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ApiMeta,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    pub cached: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: ApiMeta { cached: false },
        }
    }

    pub fn cached(data: T, cached: bool) -> Self {
        Self {
            data,
            meta: ApiMeta { cached },
        }
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/signal", signals::router())
        .merge(market::router())
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::config::Config;
    use crate::error::Result;
    use crate::services::{LivePriceCache, PairsCache, ServiceDefaults, TradePlanService};
    use crate::sources::{ExchangeClient, ExchangeRegistry};
    use crate::types::{Candle, Exchange, Timeframe};
    use crate::AppState;

    /// Exchange serving a fixed uptrending series for BTCUSDT.
    pub struct FixtureExchange;

    pub fn candles() -> Vec<Candle> {
        (0..60)
            .map(|i| {
                let close = 100.0 + i as f64 * 0.8 + if i % 2 == 0 { 0.4 } else { -0.4 };
                Candle {
                    open_time: 1_700_000_000_000 + i as i64 * 3_600_000,
                    open: close - 0.2,
                    high: close + 0.7,
                    low: close - 0.7,
                    close,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    #[async_trait]
    impl ExchangeClient for FixtureExchange {
        fn exchange(&self) -> Exchange {
            Exchange::Bybit
        }

        async fn fetch_ohlc(&self, _: &str, _: Timeframe, _: usize) -> Result<Vec<Candle>> {
            Ok(candles())
        }

        async fn get_all_pairs(&self, _: bool) -> Result<Vec<String>> {
            Ok(vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()])
        }

        async fn last_price(&self, _: &str) -> Result<Option<f64>> {
            Ok(Some(147.5))
        }
    }

    static STATE_DIRS: AtomicUsize = AtomicUsize::new(0);

    pub fn state() -> AppState {
        let dir = std::env::temp_dir().join(format!(
            "smc_signals_api_{}_{}",
            std::process::id(),
            STATE_DIRS.fetch_add(1, Ordering::SeqCst)
        ));
        let pairs_cache = Arc::new(PairsCache::new(dir, Duration::from_secs(3600)));
        let live_prices = LivePriceCache::new();
        let registry =
            ExchangeRegistry::new(Exchange::Bybit).register(Arc::new(FixtureExchange));
        AppState {
            config: Arc::new(Config::default()),
            trade_plans: Arc::new(TradePlanService::new(
                registry,
                live_prices.clone(),
                ServiceDefaults::default(),
            )),
            live_prices,
            pairs_cache,
        }
    }
}
