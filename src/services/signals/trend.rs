//! Trend strength and oscillator divergence.

use crate::types::{Candle, Divergence, TrendQuality, TrendStrength};

/// Default lookback for divergence pivots.
pub const DIVERGENCE_LOOKBACK: usize = 14;

const SLOPE_DELTA: usize = 5;
const MAX_STREAK: usize = 10;

/// Weights of the four trend components; they sum to 100.
const SHORT_SLOPE_WEIGHT: f64 = 30.0;
const LONG_SLOPE_WEIGHT: f64 = 20.0;
const SEPARATION_WEIGHT: f64 = 25.0;
const STREAK_WEIGHT: f64 = 25.0;

/// Percent change at which a slope or separation component saturates.
const SATURATION_PCT: f64 = 1.0;

fn saturate(pct: f64) -> f64 {
    (pct / SATURATION_PCT).clamp(0.0, 1.0)
}

/// Score how established the EMA trend is, 0 to 100.
///
/// Components:
/// - Short EMA slope over 5 candles, in the trend direction (max 30)
/// - Long EMA slope over 5 candles, in the trend direction (max 20)
/// - Separation between the EMAs relative to price (max 25)
/// - Streak of recent closes on the trend side of the short EMA (max 25)
///
/// With equal EMAs there is no trend direction and the strength is 0.
pub fn calculate_trend_strength(
    candles: &[Candle],
    ema_short: &[f64],
    ema_long: &[f64],
) -> TrendStrength {
    let n = candles.len();
    if n <= SLOPE_DELTA || ema_short.len() != n || ema_long.len() != n {
        return TrendStrength::none();
    }

    let price = candles[n - 1].close;
    let es = ema_short[n - 1];
    let es_prev = ema_short[n - 1 - SLOPE_DELTA];
    let el = ema_long[n - 1];
    let el_prev = ema_long[n - 1 - SLOPE_DELTA];

    if [es, es_prev, el, el_prev, price].iter().any(|v| !v.is_finite())
        || price <= 0.0
        || es_prev == 0.0
        || el_prev == 0.0
    {
        return TrendStrength::none();
    }

    let direction = if es > el {
        1.0
    } else if es < el {
        -1.0
    } else {
        return TrendStrength::none();
    };

    let short_slope = saturate(direction * (es - es_prev) / es_prev * 100.0) * SHORT_SLOPE_WEIGHT;
    let long_slope = saturate(direction * (el - el_prev) / el_prev * 100.0) * LONG_SLOPE_WEIGHT;
    let separation = saturate((es - el).abs() / price * 100.0) * SEPARATION_WEIGHT;

    let streak = candles
        .iter()
        .zip(ema_short.iter())
        .rev()
        .take_while(|(c, ema)| ema.is_finite() && direction * (c.close - **ema) > 0.0)
        .take(MAX_STREAK)
        .count();
    let streak_score = streak as f64 / MAX_STREAK as f64 * STREAK_WEIGHT;

    let strength = short_slope + long_slope + separation + streak_score;

    TrendStrength {
        strength,
        quality: TrendQuality::from_strength(strength),
    }
}

/// Indices of 5-candle fractal lows and highs within the last `lookback` candles.
fn find_pivots(candles: &[Candle], lookback: usize) -> (Vec<usize>, Vec<usize>) {
    let n = candles.len();
    let mut lows = Vec::new();
    let mut highs = Vec::new();
    if n < 5 {
        return (lows, highs);
    }

    let start = n.saturating_sub(lookback).max(2);
    for i in start..n - 2 {
        let neighbours = [i - 2, i - 1, i + 1, i + 2];
        let c = &candles[i];
        if neighbours.iter().all(|&j| c.low < candles[j].low) {
            lows.push(i);
        }
        if neighbours.iter().all(|&j| c.high > candles[j].high) {
            highs.push(i);
        }
    }

    (lows, highs)
}

/// Last two entries of a pivot list.
fn last_pair(pivots: &[usize]) -> Option<(usize, usize)> {
    match pivots {
        [.., a, b] => Some((*a, *b)),
        _ => None,
    }
}

fn rising(series: &[f64], earlier: usize, later: usize) -> bool {
    match (series.get(earlier), series.get(later)) {
        (Some(a), Some(b)) => b > a,
        _ => false,
    }
}

fn falling(series: &[f64], earlier: usize, later: usize) -> bool {
    match (series.get(earlier), series.get(later)) {
        (Some(a), Some(b)) => b < a,
        _ => false,
    }
}

/// Compare the two most recent price pivots against RSI and the MACD line.
///
/// Bullish: price prints a lower low while the oscillator prints a higher low.
/// Bearish: price prints a higher high while the oscillator prints a lower high.
/// Undefined oscillator values never produce a flag.
pub fn detect_divergence(
    candles: &[Candle],
    rsi: &[f64],
    macd_line: &[f64],
    lookback: usize,
) -> Divergence {
    let (lows, highs) = find_pivots(candles, lookback);
    let mut divergence = Divergence::default();

    if let Some((a, b)) = last_pair(&lows) {
        if candles[b].low < candles[a].low {
            divergence.rsi_bullish = rising(rsi, a, b);
            divergence.macd_bullish = rising(macd_line, a, b);
        }
    }

    if let Some((a, b)) = last_pair(&highs) {
        if candles[b].high > candles[a].high {
            divergence.rsi_bearish = falling(rsi, a, b);
            divergence.macd_bearish = falling(macd_line, a, b);
        }
    }

    divergence
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(i: usize, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            open_time: i as i64 * 3_600_000,
            open: close,
            high,
            low,
            close,
            volume: 100.0,
        }
    }

    #[test]
    fn test_trend_strength_strong_uptrend() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| {
                let close = 100.0 + i as f64;
                candle(i, close + 0.5, close - 0.5, close)
            })
            .collect();
        let ema_short: Vec<f64> = candles.iter().map(|c| c.close - 0.5).collect();
        let ema_long: Vec<f64> = candles.iter().map(|c| c.close - 2.0).collect();

        let trend = calculate_trend_strength(&candles, &ema_short, &ema_long);
        assert!((trend.strength - 100.0).abs() < 1e-9);
        assert_eq!(trend.quality, TrendQuality::VeryStrong);
    }

    #[test]
    fn test_trend_strength_downtrend_is_symmetric() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| {
                let close = 200.0 - i as f64;
                candle(i, close + 0.5, close - 0.5, close)
            })
            .collect();
        let ema_short: Vec<f64> = candles.iter().map(|c| c.close + 0.5).collect();
        let ema_long: Vec<f64> = candles.iter().map(|c| c.close + 3.0).collect();

        let trend = calculate_trend_strength(&candles, &ema_short, &ema_long);
        assert_eq!(trend.quality, TrendQuality::VeryStrong);
    }

    #[test]
    fn test_trend_strength_flat_is_weak() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| {
                let close = if i % 2 == 0 { 99.5 } else { 100.5 };
                candle(i, close + 0.3, close - 0.3, close)
            })
            .collect();
        let ema_short = vec![100.01; 20];
        let ema_long = vec![100.0; 20];

        let trend = calculate_trend_strength(&candles, &ema_short, &ema_long);
        assert!(trend.strength < 30.0);
        assert_eq!(trend.quality, TrendQuality::Weak);
    }

    #[test]
    fn test_trend_strength_equal_emas() {
        let candles: Vec<Candle> = (0..20).map(|i| candle(i, 101.0, 99.0, 100.0)).collect();
        let emas = vec![100.0; 20];
        let trend = calculate_trend_strength(&candles, &emas, &emas);
        assert_eq!(trend, TrendStrength::none());
    }

    #[test]
    fn test_trend_strength_short_series() {
        let candles: Vec<Candle> = (0..5).map(|i| candle(i, 101.0, 99.0, 100.0)).collect();
        let trend = calculate_trend_strength(&candles, &[101.0; 5], &[100.0; 5]);
        assert_eq!(trend.quality, TrendQuality::Weak);
        assert_eq!(trend.strength, 0.0);
    }

    #[test]
    fn test_trend_strength_nan_emas() {
        let candles: Vec<Candle> = (0..10).map(|i| candle(i, 101.0, 99.0, 100.0)).collect();
        let trend = calculate_trend_strength(&candles, &[f64::NAN; 10], &[100.0; 10]);
        assert_eq!(trend.strength, 0.0);
    }

    /// Two pivot lows at 4 and 10, the second lower.
    fn lower_low_candles() -> Vec<Candle> {
        (0..14)
            .map(|i| {
                let low = match i {
                    4 => 95.0,
                    10 => 93.0,
                    _ => 100.0,
                };
                candle(i, 110.0, low, 105.0)
            })
            .collect()
    }

    #[test]
    fn test_bullish_rsi_divergence() {
        let candles = lower_low_candles();
        let mut rsi = vec![50.0; 14];
        rsi[4] = 30.0;
        rsi[10] = 35.0;
        let mut macd = vec![0.0; 14];
        macd[4] = -1.0;
        macd[10] = -2.0;

        let div = detect_divergence(&candles, &rsi, &macd, DIVERGENCE_LOOKBACK);
        assert!(div.rsi_bullish);
        assert!(!div.macd_bullish);
        assert!(!div.rsi_bearish);
        assert!(!div.macd_bearish);
    }

    #[test]
    fn test_no_divergence_when_oscillator_confirms() {
        let candles = lower_low_candles();
        let mut rsi = vec![50.0; 14];
        rsi[4] = 35.0;
        rsi[10] = 30.0;
        let div = detect_divergence(&candles, &rsi, &[0.0; 14], DIVERGENCE_LOOKBACK);
        assert_eq!(div, Divergence::default());
    }

    #[test]
    fn test_bearish_macd_divergence() {
        let candles: Vec<Candle> = (0..14)
            .map(|i| {
                let high = match i {
                    3 => 115.0,
                    9 => 118.0,
                    _ => 110.0,
                };
                candle(i, high, 100.0, 105.0)
            })
            .collect();
        let mut macd = vec![0.0; 14];
        macd[3] = 2.0;
        macd[9] = 1.0;

        let div = detect_divergence(&candles, &[50.0; 14], &macd, DIVERGENCE_LOOKBACK);
        assert!(div.macd_bearish);
        assert!(!div.rsi_bearish);
    }

    #[test]
    fn test_divergence_nan_oscillator() {
        let candles = lower_low_candles();
        let div = detect_divergence(&candles, &[f64::NAN; 14], &[f64::NAN; 14], DIVERGENCE_LOOKBACK);
        assert_eq!(div, Divergence::default());
    }

    #[test]
    fn test_pivots_outside_lookback_ignored() {
        let mut candles = lower_low_candles();
        // Extend the series so the pivot at 4 falls out of the window.
        candles.extend((14..20).map(|i| candle(i, 110.0, 100.0, 105.0)));
        let mut rsi = vec![50.0; candles.len()];
        rsi[4] = 30.0;
        rsi[10] = 35.0;
        let macd = vec![0.0; candles.len()];
        let div = detect_divergence(&candles, &rsi, &macd, DIVERGENCE_LOOKBACK);
        assert!(!div.rsi_bullish);
    }
}
