use crate::error::{AppError, Result};
use crate::sources::normalize_symbol;
use crate::types::Exchange;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::ApiResponse;

#[derive(Debug, Default, Deserialize)]
pub struct PairsQuery {
    /// Bypass the pair cache.
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairsResponse {
    pub exchange: Exchange,
    pub count: usize,
    pub pairs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceQuery {
    pub exchange: Option<String>,
}

/// Where a quoted price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Live,
    Rest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub symbol: String,
    pub price: f64,
    pub source: PriceSource,
    /// Exchange queried for a REST quote.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<Exchange>,
    /// Age of a live quote in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<u64>,
}

/// GET /api/pairs/:exchange
async fn get_pairs(
    State(state): State<AppState>,
    Path(exchange): Path<String>,
    Query(query): Query<PairsQuery>,
) -> Result<Json<ApiResponse<PairsResponse>>> {
    let exchange = Exchange::from_str(&exchange)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown exchange '{}'", exchange)))?;
    let client = state.trade_plans.registry().get(exchange)?;
    // An unexpired entry is what the client will serve without a fetch.
    let from_cache = !query.refresh && state.pairs_cache.get(exchange).is_some();
    let pairs = client.get_all_pairs(query.refresh).await?;

    Ok(Json(ApiResponse::cached(
        PairsResponse {
            exchange,
            count: pairs.len(),
            pairs,
        },
        from_cache,
    )))
}

/// GET /api/price/:symbol
///
/// Serves a fresh live feed price when one is held, otherwise asks the
/// exchange. The feed is Bybit's, so naming another exchange skips it.
async fn get_price(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<ApiResponse<PriceResponse>>> {
    let symbol = normalize_symbol(&symbol);
    let registry = state.trade_plans.registry();
    let exchange = registry.resolve(query.exchange.as_deref());
    let live_allowed = query.exchange.is_none() || exchange == Exchange::Bybit;

    let live = live_allowed
        .then(|| state.live_prices.view(&symbol, state.config.live_price_max_age))
        .flatten();
    if let Some(view) = live {
        return Ok(Json(ApiResponse::cached(
            PriceResponse {
                symbol: view.symbol,
                price: view.price,
                source: PriceSource::Live,
                exchange: None,
                age_ms: Some(view.age_ms),
            },
            true,
        )));
    }

    let price = registry
        .get(exchange)?
        .last_price(&symbol)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No price for {}", symbol)))?;

    Ok(Json(ApiResponse::new(PriceResponse {
        symbol,
        price,
        source: PriceSource::Rest,
        exchange: Some(exchange),
        age_ms: None,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pairs/:exchange", get(get_pairs))
        .route("/api/price/:symbol", get(get_price))
}
