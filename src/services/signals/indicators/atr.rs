//! Average True Range (ATR) indicator.

use crate::types::Candle;

/// ATR (Average True Range) indicator.
///
/// TR = max(High-Low, |High-PrevClose|, |Low-PrevClose|); the first candle
/// has no previous close and uses High-Low. The first ATR value is the mean
/// of the first `period` true ranges, later values use Wilder's smoothing.
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    /// Calculate True Range.
    fn true_range(current: &Candle, previous: Option<&Candle>) -> f64 {
        let hl = current.high - current.low;
        match previous {
            Some(prev) => {
                let hc = (current.high - prev.close).abs();
                let lc = (current.low - prev.close).abs();
                hl.max(hc).max(lc)
            }
            None => hl,
        }
    }

    /// Calculate the ATR series. Rows before `period` candles are NaN.
    pub fn calculate(&self, candles: &[Candle]) -> Vec<f64> {
        let mut out = vec![f64::NAN; candles.len()];
        if self.period == 0 || candles.len() < self.period {
            return out;
        }

        let true_ranges: Vec<f64> = candles
            .iter()
            .enumerate()
            .map(|(i, c)| Self::true_range(c, i.checked_sub(1).map(|p| &candles[p])))
            .collect();

        let period = self.period as f64;
        let mut atr = true_ranges[..self.period].iter().sum::<f64>() / period;
        out[self.period - 1] = atr;

        for i in self.period..candles.len() {
            atr = (atr * (period - 1.0) + true_ranges[i]) / period;
            out[i] = atr;
        }

        out
    }
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
                    volume: 1000.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_atr_insufficient_data() {
        let atr = Atr::default().calculate(&create_uptrend_candles(10));
        assert!(atr.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_atr_first_value_is_mean_true_range() {
        let candles = create_uptrend_candles(14);
        let atr = Atr::default().calculate(&candles);
        // Every candle has range 3 and gaps never exceed it.
        assert!((atr[13] - 3.0).abs() < 1e-12);
        assert!(atr[12].is_nan());
    }

    #[test]
    fn test_atr_positive_value() {
        let atr = Atr::default().calculate(&create_uptrend_candles(30));
        let last = *atr.last().unwrap();
        assert!(last > 0.0, "ATR should be positive, got {}", last);
    }

    #[test]
    fn test_true_range_uses_previous_close_gap() {
        let prev = Candle {
            open_time: 0,
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 0.0,
        };
        let gap_up = Candle {
            open_time: 60_000,
            open: 110.0,
            high: 111.0,
            low: 109.0,
            close: 110.0,
            volume: 0.0,
        };
        assert_eq!(Atr::true_range(&gap_up, Some(&prev)), 11.0);
        assert_eq!(Atr::true_range(&gap_up, None), 2.0);
    }
}
