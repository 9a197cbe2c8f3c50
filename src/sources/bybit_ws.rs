use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use super::normalize_symbol;
use crate::services::LivePriceCache;

/// Bybit closes idle connections after 10 minutes without a ping.
const PING_INTERVAL: Duration = Duration::from_secs(20);
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
/// Topics per subscribe request.
const SUBSCRIBE_BATCH: usize = 10;

#[derive(Debug, Serialize)]
struct OpMessage<'a> {
    op: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    args: Vec<String>,
}

/// Ticker push. Snapshot and delta messages share this shape; deltas may
/// omit `lastPrice`.
#[derive(Debug, Deserialize)]
struct TickerMessage {
    topic: Option<String>,
    data: Option<TickerData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickerData {
    symbol: Option<String>,
    last_price: Option<String>,
}

/// Parse a ticker push into `(symbol, last price)`.
fn parse_ticker(text: &str) -> Option<(String, f64)> {
    let msg: TickerMessage = serde_json::from_str(text).ok()?;
    let topic = msg.topic?;
    let topic_symbol = topic.strip_prefix("tickers.")?;
    let data = msg.data?;
    let price: f64 = data.last_price?.parse().ok()?;
    let symbol = data.symbol.unwrap_or_else(|| topic_symbol.to_string());
    Some((symbol, price))
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

/// Bybit v5 public ticker stream feeding the live price cache.
#[derive(Clone)]
pub struct BybitTickerWs {
    url: String,
    symbols: Vec<String>,
    prices: Arc<LivePriceCache>,
}

impl BybitTickerWs {
    pub fn new(url: impl Into<String>, symbols: &[String], prices: Arc<LivePriceCache>) -> Self {
        Self {
            url: url.into(),
            symbols: symbols.iter().map(|s| normalize_symbol(s)).collect(),
            prices,
        }
    }

    /// Subscribe requests for all configured symbols.
    fn subscribe_messages(&self) -> Vec<String> {
        self.symbols
            .chunks(SUBSCRIBE_BATCH)
            .filter_map(|chunk| {
                serde_json::to_string(&OpMessage {
                    op: "subscribe",
                    args: chunk.iter().map(|s| format!("tickers.{}", s)).collect(),
                })
                .ok()
            })
            .collect()
    }

    /// Run forever, reconnecting with exponential backoff.
    pub async fn connect(&self) -> anyhow::Result<()> {
        if self.symbols.is_empty() {
            info!("No live feed symbols configured, Bybit ticker stream disabled");
            return Ok(());
        }

        let mut backoff = INITIAL_BACKOFF;
        loop {
            match self.run_connection(&mut backoff).await {
                Ok(_) => warn!("Bybit WebSocket disconnected, reconnecting in {:?}", backoff),
                Err(e) => error!("Bybit WebSocket error: {}, reconnecting in {:?}", e, backoff),
            }
            tokio::time::sleep(backoff).await;
            backoff = next_backoff(backoff);
        }
    }

    async fn run_connection(&self, backoff: &mut Duration) -> anyhow::Result<()> {
        info!("Connecting to Bybit WebSocket at {}", self.url);
        let (ws_stream, _) = connect_async(self.url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();
        info!("Connected to Bybit WebSocket, subscribing {} tickers", self.symbols.len());
        *backoff = INITIAL_BACKOFF;

        for msg in self.subscribe_messages() {
            write.send(Message::Text(msg)).await?;
        }

        let ping = serde_json::to_string(&OpMessage {
            op: "ping",
            args: Vec::new(),
        })?;
        let mut ping_timer = tokio::time::interval(PING_INTERVAL);
        ping_timer.tick().await;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => self.handle_message(&text),
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("Bybit WebSocket closed");
                            break;
                        }
                        Some(Err(e)) => {
                            error!("Bybit WebSocket read error: {}", e);
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                _ = ping_timer.tick() => {
                    write.send(Message::Text(ping.clone())).await?;
                }
            }
        }

        Ok(())
    }

    fn handle_message(&self, text: &str) {
        if let Some((symbol, price)) = parse_ticker(text) {
            debug!("Bybit live price: {} = {}", symbol, price);
            self.prices.update(&symbol, price);
        }
    }
}
