//! Direction Resolver.

use crate::types::{Direction, Divergence, Side, TrendStrength};

/// RSI above this blocks an automatic long.
pub const RSI_OVERBOUGHT: f64 = 70.0;
/// RSI below this blocks an automatic short.
pub const RSI_OVERSOLD: f64 = 30.0;

/// Last-row readings the resolver decides on.
#[derive(Debug, Clone, Copy)]
pub struct DirectionInputs {
    pub ema_short: f64,
    pub ema_long: f64,
    pub rsi: f64,
    pub trend: TrendStrength,
    pub divergence: Divergence,
    pub forced: Option<Side>,
}

/// Pick long, short or neutral.
///
/// EMA order sets the side as long as RSI is not stretched against it. A weak
/// trend downgrades the pick to neutral unless a divergence flag backs it up.
/// A forced side replaces the outcome unconditionally.
pub fn resolve_direction(inputs: &DirectionInputs) -> Direction {
    if let Some(side) = inputs.forced {
        return side.into();
    }

    let auto = if inputs.ema_short > inputs.ema_long && inputs.rsi < RSI_OVERBOUGHT {
        Some(Side::Long)
    } else if inputs.ema_short < inputs.ema_long && inputs.rsi > RSI_OVERSOLD {
        Some(Side::Short)
    } else {
        None
    };

    match auto {
        Some(side) if inputs.trend.quality.is_weak() && !inputs.divergence.supports(side) => {
            Direction::Neutral
        }
        Some(side) => side.into(),
        None => Direction::Neutral,
    }
}
