//! Trade-Plan Builder: entry, stop and targets for a resolved side.

use super::structure::{find_swing_point, recent_extreme, SWING_LOOKBACK};
use crate::types::{Candle, Fvg, OrderBlock, Side, TrendStrength};

/// Stop distance beyond a structural level, in ATRs.
const STOP_BUFFER_ATR: f64 = 0.2;
/// Price within this many ATRs of the long EMA counts as a pullback.
const PULLBACK_ATR: f64 = 1.5;
/// Fallback stop distance, in ATRs.
const FALLBACK_STOP_ATR: f64 = 2.0;
/// Minimum stop distance after a wrong-side clamp.
const CLAMP_STOP_ATR: f64 = 1.5;
const CLAMP_STOP_PCT: f64 = 0.01;
/// Risk below this is treated as zero.
const MIN_RISK: f64 = 1e-8;
/// TP1 and the minimum reward accepted from a swing extreme, in multiples of risk.
const TP1_R: f64 = 1.5;
const STRONG_TREND_R: f64 = 3.0;
const DEFAULT_R: f64 = 2.5;
/// Candles searched for a swing extreme target.
const TARGET_WINDOW: usize = 50;

/// Everything the builder reads.
#[derive(Debug, Clone, Copy)]
pub struct PlanInputs<'a> {
    pub side: Side,
    pub candles: &'a [Candle],
    pub current_price: f64,
    pub ema_long: f64,
    /// Floored ATR, always positive.
    pub atr: f64,
    pub relevant_fvg: Option<Fvg>,
    pub order_block: Option<OrderBlock>,
    pub trend: TrendStrength,
}

/// Price levels of a trade plan before confidence scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanLevels {
    pub entry: f64,
    pub stop_loss: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub risk_reward: f64,
}

impl PlanLevels {
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn entry_price(inputs: &PlanInputs) -> f64 {
    if let (Some(fvg), Some(_)) = (inputs.relevant_fvg, inputs.order_block) {
        return match inputs.side {
            Side::Long => fvg.low,
            Side::Short => fvg.high,
        };
    }

    // Enter at the long EMA on a pullback instead of chasing price.
    if (inputs.current_price - inputs.ema_long).abs() <= PULLBACK_ATR * inputs.atr {
        inputs.ema_long
    } else {
        inputs.current_price
    }
}

fn stop_price(inputs: &PlanInputs, entry: f64) -> f64 {
    let sign = inputs.side.sign();
    let buffer = STOP_BUFFER_ATR * inputs.atr;

    let mut stop = if let Some(swing) = find_swing_point(inputs.candles, inputs.side, SWING_LOOKBACK) {
        swing - sign * buffer
    } else if let Some(ob) = inputs.order_block {
        let bound = match inputs.side {
            Side::Long => ob.low,
            Side::Short => ob.high,
        };
        bound - sign * buffer
    } else {
        entry - sign * FALLBACK_STOP_ATR * inputs.atr
    };

    // Stop must sit on the risk side of entry.
    if sign * (entry - stop) <= 0.0 {
        let distance = (CLAMP_STOP_ATR * inputs.atr).max(CLAMP_STOP_PCT * entry.abs());
        stop = entry - sign * distance;
    }

    if (entry - stop).abs() < MIN_RISK {
        stop = entry - sign * FALLBACK_STOP_ATR * inputs.atr;
    }

    stop
}

/// Derive entry, stop, both targets and the reward-to-risk ratio.
pub fn build_trade_plan(inputs: &PlanInputs) -> PlanLevels {
    let sign = inputs.side.sign();
    let entry = entry_price(inputs);
    let stop_loss = stop_price(inputs, entry);
    let risk = (entry - stop_loss).abs();

    let swing_target = recent_extreme(inputs.candles, inputs.side, TARGET_WINDOW)
        .filter(|extreme| sign * (extreme - entry) >= TP1_R * risk);

    let tp2 = match swing_target {
        Some(extreme) => extreme,
        None => {
            let r = if inputs.trend.quality.is_strong() {
                STRONG_TREND_R
            } else {
                DEFAULT_R
            };
            entry + sign * risk * r
        }
    };
    let tp1 = entry + sign * TP1_R * risk;

    PlanLevels {
        entry,
        stop_loss,
        tp1,
        tp2,
        risk_reward: round2((tp2 - entry).abs() / risk),
    }
}
