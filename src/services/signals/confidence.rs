//! Confidence Scorer.
//!
//! A weighted sum of rule contributions, clamped to 0..100. Every rule that
//! fires appends a reason; reasons never change the score.

use crate::types::{ConfidenceLabel, Fvg, IndicatorSnapshot, OrderBlock, Side};

/// Entry within this percentage of the gap level earns the proximity bonus.
const FVG_PROXIMITY_PCT: f64 = 0.2;
const STOCH_MIN: i32 = -5;
const STOCH_MAX: i32 = 12;

/// Inputs to the scorer beyond the indicator snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInputs<'a> {
    pub side: Side,
    pub snapshot: &'a IndicatorSnapshot,
    pub relevant_fvg: Option<Fvg>,
    pub order_block: Option<OrderBlock>,
    pub entry: f64,
    pub current_price: f64,
}

/// Score, label and the reasons behind them.
#[derive(Debug, Clone, PartialEq)]
pub struct Confidence {
    pub score: u8,
    pub label: ConfidenceLabel,
    pub reasons: Vec<String>,
}

struct Tally {
    score: i32,
    reasons: Vec<String>,
}

impl Tally {
    fn add(&mut self, points: i32, reason: impl Into<String>) {
        self.score += points;
        self.reasons.push(reason.into());
    }
}

fn score_ema(tally: &mut Tally, side: Side, ema_short: f64, ema_long: f64, divisor: f64) {
    let aligned = match side {
        Side::Long => ema_short > ema_long,
        Side::Short => ema_short < ema_long,
    };
    let opposed = match side {
        Side::Long => ema_short < ema_long,
        Side::Short => ema_short > ema_long,
    };

    if aligned {
        let label = match side {
            Side::Long => "EMA bullish (short > long)",
            Side::Short => "EMA bearish (short < long)",
        };
        tally.add(8, label);
    } else if opposed {
        tally.add(-5, "EMA against trade direction");
    }

    let spread = (ema_short - ema_long).abs() / divisor * 100.0;
    if spread > 1.0 {
        tally.add(6, "Strong EMA spread (>1%)");
    } else if spread > 0.5 {
        tally.add(3, "Moderate EMA spread");
    }
}

fn score_macd(tally: &mut Tally, side: Side, histogram: f64) {
    let with_trade = match side {
        Side::Long => histogram > 0.0,
        Side::Short => histogram < 0.0,
    };
    let against_trade = match side {
        Side::Long => histogram < 0.0,
        Side::Short => histogram > 0.0,
    };

    if with_trade {
        let label = match side {
            Side::Long => "MACD bullish",
            Side::Short => "MACD bearish",
        };
        tally.add(10, label);
        if histogram.abs() > 0.05 {
            tally.add(7, "Strong MACD momentum");
        } else if histogram.abs() > 0.01 {
            tally.add(3, "Building MACD momentum");
        }
    } else if against_trade {
        tally.add(-8, "MACD against trade direction");
    }
}

fn score_rsi(tally: &mut Tally, side: Side, rsi: f64) {
    let favourable_mild = match side {
        Side::Long => (30.0..40.0).contains(&rsi),
        Side::Short => rsi > 60.0 && rsi <= 70.0,
    };
    let stretched = match side {
        Side::Long => rsi > 70.0,
        Side::Short => rsi < 30.0,
    };
    let unfavourable_mild = match side {
        Side::Long => rsi > 60.0 && rsi <= 70.0,
        Side::Short => (30.0..40.0).contains(&rsi),
    };

    if (40.0..=60.0).contains(&rsi) {
        tally.add(12, "RSI neutral (40-60)");
    } else if favourable_mild {
        tally.add(10, "RSI favourable (room to run)");
    } else if stretched {
        let label = match side {
            Side::Long => "RSI overbought for a long",
            Side::Short => "RSI oversold for a short",
        };
        tally.add(-10, label);
    } else if unfavourable_mild {
        tally.add(5, "RSI acceptable (30-40/60-70)");
    } else {
        tally.add(0, "RSI extreme (less ideal)");
    }
}

fn score_structure(tally: &mut Tally, inputs: &ConfidenceInputs, divisor: f64) {
    if inputs.relevant_fvg.is_some() {
        tally.add(8, "Valid FVG");
    }
    if inputs.order_block.is_some() {
        tally.add(7, "Valid order block");
    }
    if let Some(fvg) = inputs.relevant_fvg {
        let distance_pct = (inputs.entry - fvg.level).abs() / divisor * 100.0;
        if distance_pct <= FVG_PROXIMITY_PCT {
            tally.add(5, "Entry near FVG (<0.2%)");
        }
    }
}

fn score_stochastic(tally: &mut Tally, side: Side, k: Option<f64>, d: Option<f64>) {
    let (k, d) = match (k, d) {
        (Some(k), Some(d)) => (k, d),
        _ => {
            tally.add(0, "Stochastic unavailable");
            return;
        }
    };

    let mut sub = Tally {
        score: 0,
        reasons: Vec::new(),
    };

    match side {
        Side::Long if k > d => {
            sub.add(8, "Stoch bullish crossover");
            if k < 20.0 {
                sub.add(4, "Stoch oversold (supportive)");
            } else if k > 80.0 {
                sub.add(-3, "Stoch overbought (caution)");
            }
        }
        Side::Short if k < d => {
            sub.add(8, "Stoch bearish crossover");
            if k > 80.0 {
                sub.add(4, "Stoch overbought (supportive)");
            } else if k < 20.0 {
                sub.add(-3, "Stoch oversold (caution)");
            }
        }
        Side::Long if k < 30.0 => sub.add(3, "Stoch low, no crossover yet"),
        Side::Short if k > 70.0 => sub.add(3, "Stoch high, no crossover yet"),
        _ => {}
    }

    tally.score += sub.score.clamp(STOCH_MIN, STOCH_MAX);
    tally.reasons.append(&mut sub.reasons);
}

fn score_volume(tally: &mut Tally, ratio: Option<f64>) {
    let ratio = match ratio {
        Some(r) if r.is_finite() => r,
        _ => {
            tally.add(0, "Volume data unavailable");
            return;
        }
    };

    if ratio >= 1.5 {
        tally.add(13, format!("High volume (x{:.2})", ratio));
    } else if ratio >= 1.0 {
        tally.add(8, format!("Above-average volume (x{:.2})", ratio));
    } else if ratio >= 0.7 {
        tally.add(3, format!("Average volume (x{:.2})", ratio));
    } else {
        tally.add(-7, format!("Low volume (x{:.2})", ratio));
    }
}

/// Score a directional plan.
///
/// NaN readings simply fail every comparison, so they contribute nothing
/// instead of poisoning the total.
pub fn calculate_confidence(inputs: &ConfidenceInputs) -> Confidence {
    let snap = inputs.snapshot;
    let divisor = if inputs.current_price != 0.0 {
        inputs.current_price
    } else {
        1.0
    };

    let mut tally = Tally {
        score: 0,
        reasons: Vec::new(),
    };

    score_ema(&mut tally, inputs.side, snap.ema_short, snap.ema_long, divisor);
    score_macd(&mut tally, inputs.side, snap.macd_histogram);
    score_rsi(&mut tally, inputs.side, snap.rsi);
    score_structure(&mut tally, inputs, divisor);
    score_stochastic(&mut tally, inputs.side, snap.stoch_k, snap.stoch_d);
    score_volume(&mut tally, snap.volume_ratio);

    let score = tally.score.clamp(0, 100) as u8;

    Confidence {
        score,
        label: ConfidenceLabel::from_score(score),
        reasons: tally.reasons,
    }
}
