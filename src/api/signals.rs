//! Signal API endpoint.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::ApiResponse;
use crate::error::{AppError, Result};
use crate::services::signals::format_plan_text;
use crate::services::SignalRequest;
use crate::types::Side;
use crate::AppState;

const DEFAULT_TIMEFRAME: &str = "1h";

/// Query parameters for the signal endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SignalQuery {
    /// Candle interval, e.g. `15m`, `1h`, `1d`.
    pub timeframe: Option<String>,
    pub exchange: Option<String>,
    /// `long`, `short`, or `auto`/absent for automatic resolution.
    pub direction: Option<String>,
    pub ema_short: Option<usize>,
    pub ema_long: Option<usize>,
    /// `text` for the plain-text rendering, JSON otherwise.
    pub format: Option<String>,
}

/// Parse a forced direction. Anything other than long/short/auto is rejected.
pub fn parse_forced_direction(value: Option<&str>) -> Result<Option<Side>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("auto") => Ok(None),
        Some(v) => Side::from_str(v).map(Some).ok_or_else(|| {
            AppError::BadRequest(format!("Invalid direction '{}': expected long or short", v))
        }),
    }
}

impl SignalQuery {
    fn wants_text(&self) -> bool {
        self.format
            .as_deref()
            .map(|f| f.trim().eq_ignore_ascii_case("text"))
            .unwrap_or(false)
    }

    fn into_request(self, symbol: String) -> Result<SignalRequest> {
        Ok(SignalRequest {
            forced_direction: parse_forced_direction(self.direction.as_deref())?,
            symbol,
            timeframe: self
                .timeframe
                .unwrap_or_else(|| DEFAULT_TIMEFRAME.to_string()),
            exchange: self.exchange,
            ema_short: self.ema_short,
            ema_long: self.ema_long,
        })
    }
}

/// Create the signal router.
pub fn router() -> Router<AppState> {
    Router::new().route("/:symbol", get(get_signal))
}

/// GET /api/signal/:symbol
async fn get_signal(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<SignalQuery>,
) -> Result<Response> {
    let text = query.wants_text();
    let request = query.into_request(symbol)?;
    let report = state.trade_plans.generate_trade_plan(&request).await?;

    if text {
        Ok(format_plan_text(&report).into_response())
    } else {
        Ok(Json(ApiResponse::new(report)).into_response())
    }
}
