use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::http::{parse_number, parse_timestamp, HttpFetcher};
use super::{cached_pairs, ExchangeClient};
use crate::error::{AppError, Result};
use crate::services::PairsCache;
use crate::types::{Candle, Exchange, Timeframe};

const BYBIT_HOSTS: [&str; 2] = ["https://api.bybit.com", "https://api.bybitglobal.com"];
const MAX_LIMIT: usize = 1000;
const MAX_INSTRUMENT_PAGES: usize = 20;

/// Common v5 envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitResponse<T> {
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct KlineResult {
    #[serde(default)]
    list: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstrumentsResult {
    #[serde(default)]
    list: Vec<Instrument>,
    #[serde(default)]
    next_page_cursor: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Instrument {
    symbol: String,
    #[serde(default)]
    quote_coin: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct TickersResult {
    #[serde(default)]
    list: Vec<BybitTicker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitTicker {
    last_price: String,
}

/// Bybit v5 linear perpetuals client.
#[derive(Clone)]
pub struct BybitClient {
    http: HttpFetcher,
    pairs: Arc<PairsCache>,
}

/// Bybit kline interval for a timeframe.
fn interval(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::OneMinute => "1",
        Timeframe::ThreeMinutes => "3",
        Timeframe::FiveMinutes => "5",
        Timeframe::FifteenMinutes => "15",
        Timeframe::ThirtyMinutes => "30",
        Timeframe::OneHour => "60",
        Timeframe::TwoHours => "120",
        Timeframe::FourHours => "240",
        Timeframe::SixHours => "360",
        Timeframe::OneDay => "D",
        Timeframe::OneWeek => "W",
        Timeframe::OneMonth => "M",
    }
}

/// Unwrap a v5 envelope; a non-zero `retCode` is an API error.
fn into_result<T>(response: BybitResponse<T>) -> Result<T> {
    if response.ret_code != 0 {
        return Err(AppError::ExternalApi(format!(
            "Bybit retCode {}: {}",
            response.ret_code, response.ret_msg
        )));
    }
    response
        .result
        .ok_or_else(|| AppError::ExternalApi("Bybit response without result".to_string()))
}

/// Rows are `[start, open, high, low, close, volume, turnover]` strings,
/// newest first. Returned oldest first.
fn parse_klines(rows: &[Value]) -> Vec<Candle> {
    let mut candles: Vec<Candle> = rows
        .iter()
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
        .collect();
    candles.sort_by_key(|c| c.open_time);
    candles
}

fn trading_usdt_symbols(list: Vec<Instrument>) -> impl Iterator<Item = String> {
    list.into_iter()
        .filter(|i| i.status == "Trading" && (i.quote_coin == "USDT" || i.symbol.ends_with("USDT")))
        .map(|i| i.symbol)
}

impl BybitClient {
    pub fn new(http: HttpFetcher, pairs: Arc<PairsCache>) -> Self {
        Self { http, pairs }
    }

    /// GET a v5 endpoint, trying the fallback host when the primary fails.
    async fn get_v5<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut last_err = None;
        for host in BYBIT_HOSTS {
            let url = format!("{}{}", host, path);
            match self.http.get_json::<BybitResponse<T>>("Bybit", &url, query).await {
                Ok(response) => return into_result(response),
                Err(e) => {
                    warn!("Bybit host {} failed: {}", host, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| AppError::ExternalApi("No Bybit host".to_string())))
    }

    async fn fetch_pairs(&self) -> Result<Vec<String>> {
        let mut pairs = Vec::new();
        let mut cursor = String::new();

        for _ in 0..MAX_INSTRUMENT_PAGES {
            let mut query = vec![
                ("category", "linear".to_string()),
                ("status", "Trading".to_string()),
                ("limit", "1000".to_string()),
            ];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.clone()));
            }

            let page: InstrumentsResult = self
                .get_v5("/v5/market/instruments-info", &query)
                .await?;
            pairs.extend(trading_usdt_symbols(page.list));

            if page.next_page_cursor.is_empty() {
                break;
            }
            cursor = page.next_page_cursor;
        }

        pairs.sort();
        pairs.dedup();
        info!("Fetched {} Bybit linear pairs", pairs.len());
        Ok(pairs)
    }
}

#[async_trait]
impl ExchangeClient for BybitClient {
    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }

    async fn fetch_ohlc(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let symbol = self.normalize_symbol(symbol);
        let query = [
            ("category", "linear".to_string()),
            ("symbol", symbol.clone()),
            ("interval", interval(timeframe).to_string()),
            ("limit", limit.clamp(1, MAX_LIMIT).to_string()),
        ];

        let result: KlineResult = self.get_v5("/v5/market/kline", &query).await?;
        let candles = parse_klines(&result.list);
        debug!("Bybit {} {}: {} candles", symbol, timeframe, candles.len());
        Ok(candles)
    }

    async fn get_all_pairs(&self, force_refresh: bool) -> Result<Vec<String>> {
        cached_pairs(&self.pairs, Exchange::Bybit, force_refresh, || {
            self.fetch_pairs()
        })
        .await
    }

    async fn last_price(&self, symbol: &str) -> Result<Option<f64>> {
        let query = [
            ("category", "linear".to_string()),
            ("symbol", self.normalize_symbol(symbol)),
        ];
        let result: TickersResult = self.get_v5("/v5/market/tickers", &query).await?;
        Ok(result
            .list
            .first()
            .and_then(|t| t.last_price.parse::<f64>().ok())
            .filter(|p| *p > 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interval_mapping() {
        assert_eq!(interval(Timeframe::OneHour), "60");
        assert_eq!(interval(Timeframe::FourHours), "240");
        assert_eq!(interval(Timeframe::OneDay), "D");
        assert_eq!(interval(Timeframe::OneMonth), "M");
    }

    #[test]
    fn test_kline_rows_reversed_to_ascending() {
        let response: BybitResponse<KlineResult> = serde_json::from_value(json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "category": "linear",
                "symbol": "BTCUSDT",
                "list": [
                    ["1700007200000", "102", "103", "101", "102.5", "10", "1000"],
                    ["1700003600000", "101", "102", "100", "102", "11", "1100"],
                    ["1700000000000", "100", "101", "99", "101", "12", "1200"]
                ]
            }
        }))
        .unwrap();

        let candles = parse_klines(&into_result(response).unwrap().list);
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].open_time, 1_700_000_000_000);
        assert_eq!(candles[0].close, 101.0);
        assert_eq!(candles[2].close, 102.5);
        assert_eq!(candles[2].volume, 10.0);
    }

    #[test]
    fn test_non_zero_ret_code_is_error() {
        let response: BybitResponse<KlineResult> = serde_json::from_value(json!({
            "retCode": 10001,
            "retMsg": "params error: symbol invalid",
            "result": {}
        }))
        .unwrap();
        let err = into_result(response).unwrap_err();
        assert!(err.to_string().contains("10001"));
    }

    #[test]
    fn test_instruments_page() {
        let response: BybitResponse<InstrumentsResult> = serde_json::from_value(json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {
                "list": [
                    {"symbol": "BTCUSDT", "quoteCoin": "USDT", "status": "Trading"},
                    {"symbol": "BTCPERP", "quoteCoin": "USDC", "status": "Trading"},
                    {"symbol": "OLDUSDT", "quoteCoin": "USDT", "status": "Closed"}
                ],
                "nextPageCursor": "abc"
            }
        }))
        .unwrap();

        let page = into_result(response).unwrap();
        assert_eq!(page.next_page_cursor, "abc");
        let symbols: Vec<String> = trading_usdt_symbols(page.list).collect();
        assert_eq!(symbols, vec!["BTCUSDT"]);
    }

    #[test]
    fn test_ticker_deserialization() {
        let result: TickersResult = serde_json::from_value(json!({
            "category": "linear",
            "list": [{"symbol": "ETHUSDT", "lastPrice": "2250.35", "bid1Price": "2250.3"}]
        }))
        .unwrap();
        assert_eq!(result.list[0].last_price, "2250.35");
    }
}
