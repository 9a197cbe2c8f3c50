use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::http::{parse_number, parse_timestamp, HttpFetcher};
use super::{cached_pairs, ExchangeClient};
use crate::error::Result;
use crate::services::PairsCache;
use crate::types::{Candle, Exchange, Timeframe};

const BINANCE_FAPI_URL: &str = "https://fapi.binance.com/fapi/v1";
const MAX_LIMIT: usize = 1500;

/// One entry of `/exchangeInfo` symbols.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceSymbol {
    symbol: String,
    #[serde(default)]
    contract_type: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct BinanceExchangeInfo {
    symbols: Vec<BinanceSymbol>,
}

#[derive(Debug, Deserialize)]
struct BinanceTickerPrice {
    price: String,
}

/// Binance USDT-margined futures client.
#[derive(Clone)]
pub struct BinanceClient {
    http: HttpFetcher,
    pairs: Arc<PairsCache>,
}

impl BinanceClient {
    pub fn new(http: HttpFetcher, pairs: Arc<PairsCache>) -> Self {
        Self { http, pairs }
    }

    async fn fetch_pairs(&self) -> Result<Vec<String>> {
        let url = format!("{}/exchangeInfo", BINANCE_FAPI_URL);
        let info: BinanceExchangeInfo = self.http.get_json("Binance", &url, &[]).await?;
        let pairs = perpetual_usdt_pairs(info);
        info!("Fetched {} Binance perpetual pairs", pairs.len());
        Ok(pairs)
    }
}

/// Kline rows are `[openTime, open, high, low, close, volume, closeTime, ...]`
/// with prices as strings. Malformed rows are skipped.
fn parse_klines(rows: &[Value]) -> Vec<Candle> {
    rows.iter()
        .filter_map(|row| {
            let row = row.as_array()?;
            if row.len() < 6 {
                return None;
            }
            Some(Candle {
                open_time: parse_timestamp(&row[0])?,
                open: parse_number(&row[1])?,
                high: parse_number(&row[2])?,
                low: parse_number(&row[3])?,
                close: parse_number(&row[4])?,
                volume: parse_number(&row[5])?,
            })
        })
        .collect()
}

fn perpetual_usdt_pairs(info: BinanceExchangeInfo) -> Vec<String> {
    let mut pairs: Vec<String> = info
        .symbols
        .into_iter()
        .filter(|s| {
            s.contract_type == "PERPETUAL" && s.status == "TRADING" && s.symbol.ends_with("USDT")
        })
        .map(|s| s.symbol)
        .collect();
    pairs.sort();
    pairs
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    async fn fetch_ohlc(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let symbol = self.normalize_symbol(symbol);
        let url = format!("{}/klines", BINANCE_FAPI_URL);
        let query = [
            ("symbol", symbol.clone()),
            ("interval", timeframe.as_str().to_string()),
            ("limit", limit.clamp(1, MAX_LIMIT).to_string()),
        ];

        let rows: Vec<Value> = self.http.get_json("Binance", &url, &query).await?;
        let candles = parse_klines(&rows);
        debug!("Binance {} {}: {} candles", symbol, timeframe, candles.len());
        Ok(candles)
    }

    async fn get_all_pairs(&self, force_refresh: bool) -> Result<Vec<String>> {
        cached_pairs(&self.pairs, Exchange::Binance, force_refresh, || {
            self.fetch_pairs()
        })
        .await
    }

    async fn last_price(&self, symbol: &str) -> Result<Option<f64>> {
        let url = format!("{}/ticker/price", BINANCE_FAPI_URL);
        let query = [("symbol", self.normalize_symbol(symbol))];
        let ticker: BinanceTickerPrice = self.http.get_json("Binance", &url, &query).await?;
        Ok(ticker.price.parse().ok().filter(|p: &f64| *p > 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_klines() {
        let rows = vec![
            json!([1700000000000i64, "100.0", "101.5", "99.5", "101.0", "1234.5", 1700003599999i64, "0", 10, "0", "0", "0"]),
            json!([1700003600000i64, "101.0", "102.0", "100.5", "101.8", "900", 1700007199999i64, "0", 10, "0", "0", "0"]),
        ];
        let candles = parse_klines(&rows);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time, 1_700_000_000_000);
        assert_eq!(candles[0].high, 101.5);
        assert_eq!(candles[1].close, 101.8);
        assert_eq!(candles[1].volume, 900.0);
    }

    #[test]
    fn test_parse_klines_skips_malformed() {
        let rows = vec![
            json!([1700000000000i64, "100.0", "101.5"]),
            json!({"open": 1}),
            json!([1700000000000i64, "x", "101.5", "99.5", "101.0", "1"]),
        ];
        assert!(parse_klines(&rows).is_empty());
    }

    #[test]
    fn test_perpetual_usdt_filter() {
        let info: BinanceExchangeInfo = serde_json::from_value(json!({
            "symbols": [
                {"symbol": "ETHUSDT", "contractType": "PERPETUAL", "status": "TRADING"},
                {"symbol": "BTCUSDT", "contractType": "PERPETUAL", "status": "TRADING"},
                {"symbol": "BTCUSDT_240329", "contractType": "CURRENT_QUARTER", "status": "TRADING"},
                {"symbol": "BTCBUSD", "contractType": "PERPETUAL", "status": "TRADING"},
                {"symbol": "LUNAUSDT", "contractType": "PERPETUAL", "status": "SETTLING"}
            ]
        }))
        .unwrap();
        assert_eq!(perpetual_usdt_pairs(info), vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn test_ticker_price_deserialization() {
        let ticker: BinanceTickerPrice =
            serde_json::from_str(r#"{"symbol":"BTCUSDT","price":"43500.10","time":1}"#).unwrap();
        assert_eq!(ticker.price, "43500.10");
    }
}
