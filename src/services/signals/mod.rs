//! Trade signal pipeline.
//!
//! Indicators, market structure, direction, trade plan and confidence are
//! computed in one synchronous pass over a candle series. Nothing here fetches
//! data or reads shared state: a live price, when the caller has one, comes in
//! through [`PlanParams::current_price_override`].

pub mod confidence;
pub mod direction;
pub mod format;
pub mod indicators;
pub mod plan;
pub mod structure;
pub mod trend;

pub use confidence::{calculate_confidence, Confidence, ConfidenceInputs};
pub use direction::{resolve_direction, DirectionInputs};
pub use format::{format_plan_text, format_price_dynamic};
pub use indicators::{compute_indicators, latest_snapshot};
pub use plan::{build_trade_plan, PlanInputs, PlanLevels};
pub use structure::{detect_fvg, find_smc_levels, find_swing_point};
pub use trend::{calculate_trend_strength, detect_divergence};

use tracing::debug;

use self::trend::DIVERGENCE_LOOKBACK;

use crate::error::SignalError;
use crate::types::{
    Candle, DirectionalResult, NeutralResult, Side, TradePlan, TradePlanResult,
};

/// Fewest candles the pipeline accepts with default EMA periods.
pub const MIN_CANDLES: usize = 50;

/// ATR fallback as a fraction of price.
const ATR_FLOOR_PCT: f64 = 0.002;
const ATR_MIN: f64 = 1e-8;

/// Parameters for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanParams {
    pub ema_short: usize,
    pub ema_long: usize,
    /// Replaces the automatically resolved direction.
    pub forced_direction: Option<Side>,
    /// Current price to use instead of the last close (e.g. from a live feed).
    pub current_price_override: Option<f64>,
}

impl Default for PlanParams {
    fn default() -> Self {
        Self {
            ema_short: 13,
            ema_long: 21,
            forced_direction: None,
            current_price_override: None,
        }
    }
}

impl PlanParams {
    /// Candles needed for these EMA periods.
    pub fn required_candles(&self) -> usize {
        MIN_CANDLES.max(self.ema_short).max(self.ema_long)
    }
}

/// Replace a missing or non-positive ATR with 0.2% of price.
pub fn floor_atr(atr: f64, price: f64) -> f64 {
    if atr.is_finite() && atr > 0.0 {
        atr
    } else {
        (price * ATR_FLOOR_PCT).abs().max(ATR_MIN)
    }
}

/// Run the full pipeline over `candles` (ascending by open time).
///
/// Returns a neutral result when no side is taken, otherwise a directional
/// result with a scored trade plan.
///
/// # Errors
///
/// - [`SignalError::InvalidParameter`] if an EMA period is zero
/// - [`SignalError::InsufficientData`] if there are fewer candles than
///   [`PlanParams::required_candles`]
pub fn generate_trade_plan(
    candles: &[Candle],
    params: &PlanParams,
) -> Result<TradePlanResult, SignalError> {
    if params.ema_short == 0 || params.ema_long == 0 {
        return Err(SignalError::InvalidParameter(format!(
            "EMA periods must be positive (got {}/{})",
            params.ema_short, params.ema_long
        )));
    }

    let required = params.required_candles();
    if candles.len() < required {
        return Err(SignalError::InsufficientData {
            got: candles.len(),
            required,
        });
    }

    let indicators = compute_indicators(candles, params.ema_short, params.ema_long);
    let mut snapshot = latest_snapshot(candles, &indicators).ok_or(SignalError::InsufficientData {
        got: candles.len(),
        required,
    })?;

    let last_close = candles[candles.len() - 1].close;
    let current_price = params
        .current_price_override
        .filter(|p| p.is_finite() && *p > 0.0)
        .unwrap_or(last_close);
    snapshot.atr = floor_atr(snapshot.atr, current_price);

    let fvgs = detect_fvg(candles);
    let trend = calculate_trend_strength(candles, &indicators.ema_short, &indicators.ema_long);
    let divergence = detect_divergence(
        candles,
        &indicators.rsi,
        &indicators.macd_line,
        DIVERGENCE_LOOKBACK,
    );

    let direction = resolve_direction(&DirectionInputs {
        ema_short: snapshot.ema_short,
        ema_long: snapshot.ema_long,
        rsi: snapshot.rsi,
        trend,
        divergence,
        forced: params.forced_direction,
    });

    debug!(
        "Resolved {} (trend {:.1} {}, {} FVGs)",
        direction,
        trend.strength,
        trend.quality.label(),
        fvgs.len()
    );

    let side = match direction.side() {
        Some(side) => side,
        None => {
            return Ok(TradePlanResult::Neutral(NeutralResult {
                direction,
                current_price,
                insight: format::neutral_insight(&snapshot),
                snapshot,
                trend,
                divergence,
                candles: candles.to_vec(),
                indicators,
            }));
        }
    };

    let (order_block, relevant_fvg) = find_smc_levels(candles, &fvgs, side);

    let levels = build_trade_plan(&PlanInputs {
        side,
        candles,
        current_price,
        ema_long: snapshot.ema_long,
        atr: snapshot.atr,
        relevant_fvg,
        order_block,
        trend,
    });

    let confidence = calculate_confidence(&ConfidenceInputs {
        side,
        snapshot: &snapshot,
        relevant_fvg,
        order_block,
        entry: levels.entry,
        current_price,
    });

    debug!(
        "{} plan: entry {} stop {} rr {} confidence {}",
        side.as_str(),
        levels.entry,
        levels.stop_loss,
        levels.risk_reward,
        confidence.score
    );

    let insight = format::directional_insight(
        side,
        &snapshot,
        relevant_fvg.is_some(),
        &confidence.reasons,
    );

    Ok(TradePlanResult::Directional(DirectionalResult {
        direction,
        plan: TradePlan {
            direction: side,
            entry: levels.entry,
            stop_loss: levels.stop_loss,
            tp1: levels.tp1,
            tp2: levels.tp2,
            risk_reward: levels.risk_reward,
            confidence: confidence.score,
            confidence_label: confidence.label,
            reasons: confidence.reasons,
        },
        current_price,
        snapshot,
        trend,
        divergence,
        fvgs,
        relevant_fvg,
        order_block,
        insight,
        candles: candles.to_vec(),
        indicators,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Direction;

    fn create_candles(count: usize) -> Vec<Candle> {
        (0..count)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.9).sin() * 2.0 + i as f64 * 0.1;
                Candle {
                    open_time: 1_700_000_000_000 + i as i64 * 3_600_000,
                    open: close - 0.2,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 1000.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_floor_atr() {
        assert_eq!(floor_atr(1.5, 100.0), 1.5);
        assert!((floor_atr(f64::NAN, 100.0) - 0.2).abs() < 1e-12);
        assert!((floor_atr(0.0, -50.0) - 0.1).abs() < 1e-12);
        assert_eq!(floor_atr(0.0, 0.0), 1e-8);
    }

    #[test]
    fn test_required_candles() {
        assert_eq!(PlanParams::default().required_candles(), 50);
        let params = PlanParams {
            ema_long: 200,
            ..PlanParams::default()
        };
        assert_eq!(params.required_candles(), 200);
    }

    #[test]
    fn test_zero_ema_period_rejected() {
        let params = PlanParams {
            ema_short: 0,
            ..PlanParams::default()
        };
        let err = generate_trade_plan(&create_candles(60), &params).unwrap_err();
        assert!(matches!(err, SignalError::InvalidParameter(_)));
    }

    #[test]
    fn test_long_ema_needs_more_candles() {
        let params = PlanParams {
            ema_long: 100,
            ..PlanParams::default()
        };
        let err = generate_trade_plan(&create_candles(60), &params).unwrap_err();
        assert_eq!(
            err,
            SignalError::InsufficientData {
                got: 60,
                required: 100
            }
        );
    }

    #[test]
    fn test_override_price_is_used() {
        let params = PlanParams {
            forced_direction: Some(Side::Long),
            current_price_override: Some(123.0),
            ..PlanParams::default()
        };
        let result = generate_trade_plan(&create_candles(60), &params).unwrap();
        assert_eq!(result.current_price(), 123.0);
        assert_eq!(result.direction(), Direction::Long);
    }

    #[test]
    fn test_invalid_override_falls_back_to_close() {
        let candles = create_candles(60);
        let params = PlanParams {
            current_price_override: Some(f64::NAN),
            ..PlanParams::default()
        };
        let result = generate_trade_plan(&candles, &params).unwrap();
        assert_eq!(result.current_price(), candles[59].close);
    }

    #[test]
    fn test_forced_short_builds_plan() {
        let params = PlanParams {
            forced_direction: Some(Side::Short),
            ..PlanParams::default()
        };
        let result = generate_trade_plan(&create_candles(60), &params).unwrap();
        let plan = result.plan().unwrap();
        assert_eq!(plan.direction, Side::Short);
        assert!(plan.stop_loss > plan.entry);
        assert!(plan.tp1 < plan.entry);
        assert!(plan.confidence <= 100);
    }
}
