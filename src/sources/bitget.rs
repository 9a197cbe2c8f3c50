use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::http::{parse_number, parse_timestamp, HttpFetcher};
use super::{cached_pairs, ExchangeClient};
use crate::error::{AppError, Result};
use crate::services::PairsCache;
use crate::types::{Candle, Exchange, Timeframe};

const BITGET_API_URL: &str = "https://api.bitget.com/api/v2/mix/market";
const PRODUCT_TYPE: &str = "USDT-FUTURES";
const SUCCESS_CODE: &str = "00000";
const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
struct BitgetResponse<T> {
    code: String,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BitgetContract {
    symbol: String,
    #[serde(default)]
    quote_coin: String,
    #[serde(default)]
    symbol_status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BitgetTicker {
    last_pr: String,
}

/// Bitget v2 USDT-margined futures client.
#[derive(Clone)]
pub struct BitgetClient {
    http: HttpFetcher,
    pairs: Arc<PairsCache>,
}

/// Bitget candle granularity (hours and up are uppercase).
fn granularity(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::OneMinute => "1m",
        Timeframe::ThreeMinutes => "3m",
        Timeframe::FiveMinutes => "5m",
        Timeframe::FifteenMinutes => "15m",
        Timeframe::ThirtyMinutes => "30m",
        Timeframe::OneHour => "1H",
        Timeframe::TwoHours => "2H",
        Timeframe::FourHours => "4H",
        Timeframe::SixHours => "6H",
        Timeframe::OneDay => "1D",
        Timeframe::OneWeek => "1W",
        Timeframe::OneMonth => "1M",
    }
}

fn into_data<T>(response: BitgetResponse<T>) -> Result<T> {
    if response.code != SUCCESS_CODE {
        return Err(AppError::ExternalApi(format!(
            "Bitget code {}: {}",
            response.code, response.msg
        )));
    }
    response
        .data
        .ok_or_else(|| AppError::ExternalApi("Bitget response without data".to_string()))
}

/// Rows are `[ts, open, high, low, close, baseVolume, quoteVolume]`.
fn parse_candles(rows: &[Value]) -> Vec<Candle> {
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

fn usdt_contracts(contracts: Vec<BitgetContract>) -> Vec<String> {
    let mut pairs: Vec<String> = contracts
        .into_iter()
        .filter(|c| {
            (c.symbol_status.is_empty() || c.symbol_status == "normal")
                && (c.quote_coin == "USDT" || c.symbol.ends_with("USDT"))
        })
        .map(|c| c.symbol)
        .collect();
    pairs.sort();
    pairs
}

impl BitgetClient {
    pub fn new(http: HttpFetcher, pairs: Arc<PairsCache>) -> Self {
        Self { http, pairs }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", BITGET_API_URL, endpoint);
        let response: BitgetResponse<T> = self.http.get_json("Bitget", &url, query).await?;
        into_data(response)
    }

    async fn fetch_pairs(&self) -> Result<Vec<String>> {
        let query = [("productType", PRODUCT_TYPE.to_string())];
        let contracts: Vec<BitgetContract> = self.get("contracts", &query).await?;
        let pairs = usdt_contracts(contracts);
        info!("Fetched {} Bitget futures pairs", pairs.len());
        Ok(pairs)
    }
}

#[async_trait]
impl ExchangeClient for BitgetClient {
    fn exchange(&self) -> Exchange {
        Exchange::Bitget
    }

    async fn fetch_ohlc(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let symbol = self.normalize_symbol(symbol);
        let limit = limit.clamp(1, MAX_LIMIT);
        let end_time = chrono::Utc::now().timestamp_millis();
        let start_time = end_time - timeframe.duration_ms() * limit as i64;

        let query = [
            ("symbol", symbol.clone()),
            ("productType", PRODUCT_TYPE.to_string()),
            ("granularity", granularity(timeframe).to_string()),
            ("startTime", start_time.to_string()),
            ("endTime", end_time.to_string()),
            ("limit", limit.to_string()),
        ];

        let rows: Vec<Value> = self.get("candles", &query).await?;
        let candles = parse_candles(&rows);
        debug!("Bitget {} {}: {} candles", symbol, timeframe, candles.len());
        Ok(candles)
    }

    async fn get_all_pairs(&self, force_refresh: bool) -> Result<Vec<String>> {
        cached_pairs(&self.pairs, Exchange::Bitget, force_refresh, || {
            self.fetch_pairs()
        })
        .await
    }

    async fn last_price(&self, symbol: &str) -> Result<Option<f64>> {
        let query = [
            ("symbol", self.normalize_symbol(symbol)),
            ("productType", PRODUCT_TYPE.to_string()),
        ];
        let tickers: Vec<BitgetTicker> = self.get("ticker", &query).await?;
        Ok(tickers
            .first()
            .and_then(|t| t.last_pr.parse::<f64>().ok())
            .filter(|p| *p > 0.0))
    }
}
