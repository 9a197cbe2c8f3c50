use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::http::{parse_number, parse_timestamp, HttpFetcher};
use super::{cached_pairs, normalize_symbol, unsupported_timeframe, ExchangeClient};
use crate::error::Result;
use crate::services::PairsCache;
use crate::types::{Candle, Exchange, Timeframe};

const GATE_API_URL: &str = "https://api.gateio.ws/api/v4/futures/usdt";
const MAX_LIMIT: usize = 2000;
const MAX_DAILY_LIMIT: usize = 365;
const MAX_WEEKLY_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
struct GateContract {
    name: String,
    #[serde(rename = "type", default)]
    contract_type: String,
    #[serde(default)]
    in_delisting: bool,
    #[serde(default)]
    last_price: Option<String>,
}

/// Gate.io USDT-settled futures client.
#[derive(Clone)]
pub struct GateClient {
    http: HttpFetcher,
    pairs: Arc<PairsCache>,
}

/// `BTCUSDT` → `BTC_USDT`.
fn contract_name(symbol: &str) -> String {
    let symbol = normalize_symbol(symbol);
    let base = symbol.strip_suffix("USDT").unwrap_or(&symbol);
    format!("{}_USDT", base)
}

/// `BTC_USDT` → `BTCUSDT`.
fn pair_name(contract: &str) -> String {
    contract.replace('_', "")
}

/// Interval string and row cap for a timeframe. Monthly candles are not served.
fn interval(timeframe: Timeframe) -> Option<(&'static str, usize)> {
    let interval = match timeframe {
        Timeframe::OneMinute => ("1m", MAX_LIMIT),
        Timeframe::ThreeMinutes => ("3m", MAX_LIMIT),
        Timeframe::FiveMinutes => ("5m", MAX_LIMIT),
        Timeframe::FifteenMinutes => ("15m", MAX_LIMIT),
        Timeframe::ThirtyMinutes => ("30m", MAX_LIMIT),
        Timeframe::OneHour => ("1h", MAX_LIMIT),
        Timeframe::TwoHours => ("2h", MAX_LIMIT),
        Timeframe::FourHours => ("4h", MAX_LIMIT),
        Timeframe::SixHours => ("6h", MAX_LIMIT),
        Timeframe::OneDay => ("1d", MAX_DAILY_LIMIT),
        Timeframe::OneWeek => ("1w", MAX_WEEKLY_LIMIT),
        Timeframe::OneMonth => return None,
    };
    Some(interval)
}

/// Rows are objects `{t, o, h, l, c, v}` with `t` in seconds.
fn parse_candlesticks(rows: &[Value]) -> Vec<Candle> {
    let mut candles: Vec<Candle> = rows
        .iter()
        .filter_map(|row| {
            Some(Candle {
                open_time: parse_timestamp(row.get("t")?)? * 1000,
                open: parse_number(row.get("o")?)?,
                high: parse_number(row.get("h")?)?,
                low: parse_number(row.get("l")?)?,
                close: parse_number(row.get("c")?)?,
                volume: row.get("v").and_then(parse_number).unwrap_or(0.0),
            })
        })
        .collect();
    candles.sort_by_key(|c| c.open_time);
    candles
}

fn direct_usdt_pairs(contracts: Vec<GateContract>) -> Vec<String> {
    let mut pairs: Vec<String> = contracts
        .into_iter()
        .filter(|c| c.name.ends_with("_USDT") && c.contract_type == "direct" && !c.in_delisting)
        .map(|c| pair_name(&c.name))
        .collect();
    pairs.sort();
    pairs
}

impl GateClient {
    pub fn new(http: HttpFetcher, pairs: Arc<PairsCache>) -> Self {
        Self { http, pairs }
    }

    async fn fetch_pairs(&self) -> Result<Vec<String>> {
        let url = format!("{}/contracts", GATE_API_URL);
        let contracts: Vec<GateContract> = self.http.get_json("Gate", &url, &[]).await?;
        let pairs = direct_usdt_pairs(contracts);
        info!("Fetched {} Gate.io futures pairs", pairs.len());
        Ok(pairs)
    }
}

#[async_trait]
impl ExchangeClient for GateClient {
    fn exchange(&self) -> Exchange {
        Exchange::Gate
    }

    fn supports_timeframe(&self, timeframe: Timeframe) -> bool {
        interval(timeframe).is_some()
    }

    async fn fetch_ohlc(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let (interval, cap) =
            interval(timeframe).ok_or_else(|| unsupported_timeframe(Exchange::Gate, timeframe))?;
        let contract = contract_name(symbol);
        let url = format!("{}/candlesticks", GATE_API_URL);
        let query = [
            ("contract", contract.clone()),
            ("interval", interval.to_string()),
            ("limit", limit.clamp(1, cap).to_string()),
        ];

        let rows: Vec<Value> = self.http.get_json("Gate", &url, &query).await?;
        let candles = parse_candlesticks(&rows);
        debug!("Gate {} {}: {} candles", contract, timeframe, candles.len());
        Ok(candles)
    }

    async fn get_all_pairs(&self, force_refresh: bool) -> Result<Vec<String>> {
        cached_pairs(&self.pairs, Exchange::Gate, force_refresh, || {
            self.fetch_pairs()
        })
        .await
    }

    async fn last_price(&self, symbol: &str) -> Result<Option<f64>> {
        let url = format!("{}/contracts/{}", GATE_API_URL, contract_name(symbol));
        let contract: GateContract = self.http.get_json("Gate", &url, &[]).await?;
        Ok(contract
            .last_price
            .and_then(|p| p.parse::<f64>().ok())
            .filter(|p| *p > 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contract_name() {
        assert_eq!(contract_name("btc"), "BTC_USDT");
        assert_eq!(contract_name("ETH_USDT"), "ETH_USDT");
        assert_eq!(contract_name("sol/usdt"), "SOL_USDT");
        assert_eq!(pair_name("BTC_USDT"), "BTCUSDT");
    }

    #[test]
    fn test_interval_caps() {
        assert_eq!(interval(Timeframe::OneDay), Some(("1d", 365)));
        assert_eq!(interval(Timeframe::OneWeek), Some(("1w", 200)));
        assert_eq!(interval(Timeframe::OneHour).map(|(i, _)| i), Some("1h"));
        assert_eq!(interval(Timeframe::OneMonth), None);
    }

    #[test]
    fn test_candlesticks_seconds_to_millis() {
        let rows = vec![
            json!({"t": 1700003600, "o": "101", "h": "102", "l": "100", "c": "101.5", "v": 50}),
            json!({"t": 1700000000, "o": "100", "h": "101", "l": "99", "c": "101", "v": 40, "sum": "4000"}),
        ];
        let candles = parse_candlesticks(&rows);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time, 1_700_000_000_000);
        assert_eq!(candles[1].close, 101.5);
        assert_eq!(candles[1].volume, 50.0);
    }

    #[test]
    fn test_direct_contracts_only() {
        let contracts: Vec<GateContract> = serde_json::from_value(json!([
            {"name": "ETH_USDT", "type": "direct", "in_delisting": false},
            {"name": "BTC_USDT", "type": "direct", "in_delisting": false, "last_price": "43000"},
            {"name": "BTC_USD", "type": "inverse", "in_delisting": false},
            {"name": "OLD_USDT", "type": "direct", "in_delisting": true}
        ]))
        .unwrap();
        assert_eq!(direct_usdt_pairs(contracts), vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn test_supports_timeframe() {
        let client = GateClient::new(
            HttpFetcher::new(std::time::Duration::from_secs(1), 0),
            Arc::new(PairsCache::new(".test_gate_supports", std::time::Duration::from_secs(60))),
        );
        assert!(client.supports_timeframe(Timeframe::OneWeek));
        assert!(client.supports_timeframe(Timeframe::OneMinute));
        assert!(!client.supports_timeframe(Timeframe::OneMonth));
        let _ = std::fs::remove_dir_all(".test_gate_supports");
    }

    #[test]
    fn test_unsupported_monthly_is_timeframe_error() {
        let err = unsupported_timeframe(Exchange::Gate, Timeframe::OneMonth);
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("1M"));
    }
}
