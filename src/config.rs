use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::Exchange;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Exchange used when a request names none or an unknown one.
    pub default_exchange: Exchange,
    /// Default short EMA period.
    pub ema_short: usize,
    /// Default long EMA period.
    pub ema_long: usize,
    /// Candles requested per fetch.
    pub ohlc_limit: usize,
    /// Directory for pair-list cache files.
    pub pairs_cache_dir: PathBuf,
    /// Pair-list expiry.
    pub pairs_cache_ttl: Duration,
    /// REST request timeout.
    pub http_timeout: Duration,
    /// REST attempts per request.
    pub http_max_retries: u32,
    /// Bybit public linear stream.
    pub bybit_ws_url: String,
    /// Symbols subscribed on the live feed. Empty disables the feed.
    pub live_feed_symbols: Vec<String>,
    /// Live prices older than this are ignored.
    pub live_price_max_age: Duration,
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_exchange = get("DEFAULT_EXCHANGE")
            .and_then(|e| Exchange::from_str(&e))
            .unwrap_or_default();

        // Comma separated, e.g. "BTCUSDT,ETHUSDT"
        let live_feed_symbols = get("LIVE_FEED_SYMBOLS")
            .unwrap_or_else(|| "BTCUSDT,ETHUSDT,SOLUSDT".to_string())
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), 3001),
            default_exchange,
            ema_short: parse_or(get("EMA_SHORT"), 13),
            ema_long: parse_or(get("EMA_LONG"), 21),
            ohlc_limit: parse_or(get("OHLC_LIMIT"), 500),
            pairs_cache_dir: get("PAIRS_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".pairs_cache")),
            pairs_cache_ttl: Duration::from_secs(parse_or(get("PAIRS_CACHE_TTL_SECS"), 3600)),
            http_timeout: Duration::from_secs(parse_or(get("HTTP_TIMEOUT_SECS"), 30)),
            http_max_retries: parse_or(get("HTTP_MAX_RETRIES"), 3),
            bybit_ws_url: get("BYBIT_WS_URL")
                .unwrap_or_else(|| "wss://stream.bybit.com/v5/public/linear".to_string()),
            live_feed_symbols,
            live_price_max_age: Duration::from_secs(parse_or(get("LIVE_PRICE_MAX_AGE_SECS"), 60)),
        }
    }

    /// `host:port` to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
