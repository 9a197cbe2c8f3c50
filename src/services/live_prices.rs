use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Last traded price pushed by a live feed.
#[derive(Debug, Clone, Copy)]
struct LivePrice {
    price: f64,
    /// Unix milliseconds, for display.
    timestamp: i64,
    received: Instant,
}

/// Snapshot of a live price as served by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePriceView {
    pub symbol: String,
    pub price: f64,
    pub timestamp: i64,
    pub age_ms: u64,
}

/// Concurrent symbol → last price map, written by the websocket feed and
/// read by the trade plan service.
#[derive(Default)]
pub struct LivePriceCache {
    prices: DashMap<String, LivePrice>,
}

impl LivePriceCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn key(symbol: &str) -> String {
        symbol.trim().to_uppercase()
    }

    /// Record a price. Non-finite or non-positive prices are ignored.
    pub fn update(&self, symbol: &str, price: f64) {
        if !price.is_finite() || price <= 0.0 {
            return;
        }
        self.prices.insert(
            Self::key(symbol),
            LivePrice {
                price,
                timestamp: chrono::Utc::now().timestamp_millis(),
                received: Instant::now(),
            },
        );
    }

    /// Latest price if it arrived within `max_age`.
    pub fn get_fresh(&self, symbol: &str, max_age: Duration) -> Option<f64> {
        self.prices
            .get(&Self::key(symbol))
            .filter(|p| p.received.elapsed() <= max_age)
            .map(|p| p.price)
    }

    /// Display view of a price that arrived within `max_age`.
    pub fn view(&self, symbol: &str, max_age: Duration) -> Option<LivePriceView> {
        let key = Self::key(symbol);
        self.prices
            .get(&key)
            .filter(|p| p.received.elapsed() <= max_age)
            .map(|p| LivePriceView {
                symbol: key.clone(),
                price: p.price,
                timestamp: p.timestamp,
                age_ms: p.received.elapsed().as_millis() as u64,
            })
    }
}
