//! Symbol-level signal generation: resolves the exchange, checks the pair,
//! fetches candles and runs the pipeline with the freshest known price.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, Result, SignalError};
use crate::services::signals::{generate_trade_plan, PlanParams};
use crate::services::LivePriceCache;
use crate::sources::{normalize_symbol, unsupported_timeframe, ExchangeRegistry};
use crate::types::{Side, SignalReport, Timeframe};

/// One signal request as received from a caller.
#[derive(Debug, Clone, Default)]
pub struct SignalRequest {
    pub symbol: String,
    pub timeframe: String,
    /// Exchange name; the configured default when absent or unknown.
    pub exchange: Option<String>,
    pub forced_direction: Option<Side>,
    pub ema_short: Option<usize>,
    pub ema_long: Option<usize>,
}

/// Defaults applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct ServiceDefaults {
    pub ema_short: usize,
    pub ema_long: usize,
    pub ohlc_limit: usize,
    pub live_price_max_age: Duration,
}

impl From<&Config> for ServiceDefaults {
    fn from(config: &Config) -> Self {
        Self {
            ema_short: config.ema_short,
            ema_long: config.ema_long,
            ohlc_limit: config.ohlc_limit,
            live_price_max_age: config.live_price_max_age,
        }
    }
}

impl Default for ServiceDefaults {
    fn default() -> Self {
        Self {
            ema_short: 13,
            ema_long: 21,
            ohlc_limit: 500,
            live_price_max_age: Duration::from_secs(60),
        }
    }
}

/// Generates [`SignalReport`]s from live exchange data.
pub struct TradePlanService {
    registry: ExchangeRegistry,
    live_prices: Arc<LivePriceCache>,
    defaults: ServiceDefaults,
}

impl TradePlanService {
    pub fn new(
        registry: ExchangeRegistry,
        live_prices: Arc<LivePriceCache>,
        defaults: ServiceDefaults,
    ) -> Self {
        Self {
            registry,
            live_prices,
            defaults,
        }
    }

    pub fn registry(&self) -> &ExchangeRegistry {
        &self.registry
    }

    /// Pipeline parameters for a request, before any price override.
    fn plan_params(&self, request: &SignalRequest) -> PlanParams {
        PlanParams {
            ema_short: request.ema_short.unwrap_or(self.defaults.ema_short),
            ema_long: request.ema_long.unwrap_or(self.defaults.ema_long),
            forced_direction: request.forced_direction,
            current_price_override: None,
        }
    }

    /// Generate a signal for `request`.
    ///
    /// The timeframe is validated, including against what the exchange can
    /// serve, before anything is fetched. Unknown
    /// symbols are `NotFound`; too few candles is `InsufficientData`.
    pub async fn generate_trade_plan(&self, request: &SignalRequest) -> Result<SignalReport> {
        let timeframe = Timeframe::from_str(&request.timeframe)
            .ok_or_else(|| SignalError::InvalidTimeframe(request.timeframe.clone()))?;

        let mut params = self.plan_params(request);
        if params.ema_short == 0 || params.ema_long == 0 {
            return Err(SignalError::InvalidParameter(
                "EMA periods must be positive".to_string(),
            )
            .into());
        }

        let exchange = self.registry.resolve(request.exchange.as_deref());
        let client = self.registry.get(exchange)?;
        if !client.supports_timeframe(timeframe) {
            return Err(unsupported_timeframe(exchange, timeframe));
        }
        let symbol = normalize_symbol(&request.symbol);

        if !client.pair_exists(&symbol).await? {
            return Err(AppError::NotFound(format!(
                "{} is not listed on {}",
                symbol,
                exchange.label()
            )));
        }

        let limit = self.defaults.ohlc_limit.max(params.required_candles());
        let candles = client.fetch_ohlc(&symbol, timeframe, limit).await?;
        debug!("Fetched {} {} candles for {}", candles.len(), timeframe, symbol);

        params.current_price_override = self
            .live_prices
            .get_fresh(&symbol, self.defaults.live_price_max_age);

        let result = generate_trade_plan(&candles, &params)?;
        info!(
            "Signal {} {} on {}: {}",
            symbol,
            timeframe,
            exchange,
            result.direction()
        );

        Ok(SignalReport {
            symbol,
            timeframe,
            exchange,
            live_price: params.current_price_override.is_some(),
            generated_at: chrono::Utc::now().timestamp_millis(),
            result,
        })
    }
}
