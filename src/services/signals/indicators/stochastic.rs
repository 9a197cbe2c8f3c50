//! Stochastic Oscillator indicator.

use crate::types::Candle;

/// Stochastic Oscillator.
///
/// %K = (Close - Lowest Low) / (Highest High - Lowest Low) * 100 over
/// `k_period` candles; %D is the simple mean of the last `d_period` %K values.
///
/// A window with zero range, or non-finite prices, leaves %K undefined (NaN)
/// instead of failing; %D is NaN whenever any %K in its window is.
pub struct Stochastic {
    k_period: usize,
    d_period: usize,
}

impl Default for Stochastic {
    fn default() -> Self {
        Self {
            k_period: 14,
            d_period: 3,
        }
    }
}

/// %K and %D rows, aligned with the input candles.
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

impl Stochastic {
    pub fn calculate(&self, candles: &[Candle]) -> StochasticSeries {
        let n = candles.len();
        let mut k_values = vec![f64::NAN; n];
        let mut d_values = vec![f64::NAN; n];

        if self.k_period == 0 || self.d_period == 0 {
            return StochasticSeries {
                k: k_values,
                d: d_values,
            };
        }

        for i in (self.k_period.saturating_sub(1))..n {
            let window = &candles[(i + 1 - self.k_period)..=i];

            let lowest_low = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            let highest_high = window
                .iter()
                .map(|c| c.high)
                .fold(f64::NEG_INFINITY, f64::max);
            let range = highest_high - lowest_low;

            if range.is_finite() && range > 0.0 && candles[i].close.is_finite() {
                k_values[i] = (candles[i].close - lowest_low) / range * 100.0;
            }
        }

        for i in (self.d_period - 1)..n {
            let window = &k_values[(i + 1 - self.d_period)..=i];
            if window.iter().all(|v| !v.is_nan()) {
                d_values[i] = window.iter().sum::<f64>() / self.d_period as f64;
            }
        }

        StochasticSeries {
            k: k_values,
            d: d_values,
        }
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
    fn test_stochastic_warmup() {
        let stoch = Stochastic::default().calculate(&create_uptrend_candles(30));
        assert!(stoch.k[12].is_nan());
        assert!(!stoch.k[13].is_nan());
        assert!(stoch.d[14].is_nan());
        assert!(!stoch.d[15].is_nan());
    }

    #[test]
    fn test_stochastic_uptrend_high_k() {
        let stoch = Stochastic::default().calculate(&create_uptrend_candles(30));
        let k = *stoch.k.last().unwrap();
        assert!(k > 50.0, "Stochastic %K in uptrend should be > 50, got {}", k);
    }

    #[test]
    fn test_stochastic_value_range() {
        let stoch = Stochastic::default().calculate(&create_uptrend_candles(30));
        for v in stoch.k.iter().chain(stoch.d.iter()).filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn test_stochastic_flat_range_unavailable() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| Candle {
                open_time: i * 60_000,
                open: 10.0,
                high: 10.0,
                low: 10.0,
                close: 10.0,
                volume: 1.0,
            })
            .collect();
        let stoch = Stochastic::default().calculate(&candles);
        assert!(stoch.k.iter().all(|v| v.is_nan()));
        assert!(stoch.d.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_stochastic_d_is_mean_of_k() {
        let stoch = Stochastic::default().calculate(&create_uptrend_candles(30));
        let expected = (stoch.k[27] + stoch.k[28] + stoch.k[29]) / 3.0;
        assert!((stoch.d[29] - expected).abs() < 1e-12);
    }
}
