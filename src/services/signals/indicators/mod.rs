//! Technical indicator implementations.
//!
//! Every indicator returns one value per input candle. Rows without enough
//! history hold NaN rather than being dropped, so all series share the
//! candle index.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod stochastic;
pub mod volume;

pub use atr::Atr;
pub use ema::Ema;
pub use macd::{Macd, MacdSeries};
pub use rsi::Rsi;
pub use stochastic::{Stochastic, StochasticSeries};
pub use volume::VolumeEma;

use crate::types::{Candle, IndicatorSeries, IndicatorSnapshot};

/// Compute every indicator the plan pipeline reads.
pub fn compute_indicators(candles: &[Candle], ema_short: usize, ema_long: usize) -> IndicatorSeries {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let macd = Macd::default().calculate(&closes);
    let stoch = Stochastic::default().calculate(candles);

    IndicatorSeries {
        ema_short: Ema::new(ema_short).calculate(&closes),
        ema_long: Ema::new(ema_long).calculate(&closes),
        rsi: Rsi::default().calculate(candles),
        atr: Atr::default().calculate(candles),
        macd_line: macd.line,
        macd_signal: macd.signal,
        stoch_k: stoch.k,
        stoch_d: stoch.d,
        vol_ema20: VolumeEma::default().calculate(candles),
    }
}

fn defined(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// Last-row view of the indicator series.
///
/// Returns `None` for an empty candle list. Stochastic and volume fields are
/// `None` when undefined; the others stay NaN so callers can apply their own
/// fallbacks (the ATR floor, for instance).
pub fn latest_snapshot(candles: &[Candle], series: &IndicatorSeries) -> Option<IndicatorSnapshot> {
    let last = candles.len().checked_sub(1)?;
    let at = |values: &[f64]| values.get(last).copied().unwrap_or(f64::NAN);

    let macd_line = at(&series.macd_line);
    let macd_signal = at(&series.macd_signal);
    let volume = candles[last].volume;
    let volume_ema20 = defined(at(&series.vol_ema20));
    let volume_ratio = volume_ema20
        .filter(|avg| *avg > 0.0)
        .map(|avg| volume / avg);

    Some(IndicatorSnapshot {
        ema_short: at(&series.ema_short),
        ema_long: at(&series.ema_long),
        rsi: at(&series.rsi),
        atr: at(&series.atr),
        macd_line,
        macd_signal,
        macd_histogram: macd_line - macd_signal,
        stoch_k: defined(at(&series.stoch_k)),
        stoch_d: defined(at(&series.stoch_d)),
        volume,
        volume_ema20,
        volume_ratio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_uptrend_candles(count: usize) -> Vec<Candle> {
        (0..count)
            .map(|i| {
                let base = 100.0 + i as f64 * 1.5;
                Candle {
                    open_time: 1_000_000 + i as i64 * 60_000,
                    open: base,
                    high: base + 2.0,
                    low: base - 1.0,
                    close: base + 1.0,
                    volume: 1000.0 + i as f64 * 10.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_series_are_row_aligned() {
        let candles = create_uptrend_candles(60);
        let series = compute_indicators(&candles, 13, 21);
        assert_eq!(series.len(), 60);
        assert_eq!(series.ema_long.len(), 60);
        assert_eq!(series.macd_signal.len(), 60);
        assert_eq!(series.stoch_d.len(), 60);
        assert_eq!(series.vol_ema20.len(), 60);
    }

    #[test]
    fn test_snapshot_uptrend() {
        let candles = create_uptrend_candles(60);
        let series = compute_indicators(&candles, 13, 21);
        let snap = latest_snapshot(&candles, &series).unwrap();

        assert!(snap.ema_short > snap.ema_long);
        assert!(snap.rsi > 50.0);
        assert!(snap.atr > 0.0);
        assert!(snap.macd_line > 0.0);
        assert!(snap.stoch_k.is_some());
        assert!(snap.volume_ratio.unwrap() > 1.0);
    }

    #[test]
    fn test_snapshot_empty() {
        let series = compute_indicators(&[], 13, 21);
        assert!(latest_snapshot(&[], &series).is_none());
    }

    #[test]
    fn test_snapshot_zero_volume_has_no_ratio() {
        let mut candles = create_uptrend_candles(30);
        for c in candles.iter_mut() {
            c.volume = 0.0;
        }
        let series = compute_indicators(&candles, 13, 21);
        let snap = latest_snapshot(&candles, &series).unwrap();
        assert_eq!(snap.volume_ema20, Some(0.0));
        assert!(snap.volume_ratio.is_none());
    }
}
