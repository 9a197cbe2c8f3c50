//! Relative Strength Index (RSI).

use crate::types::Candle;

/// RSI with Wilder smoothing (`alpha = 1 / period`).
///
/// The first row counts as a zero change, so smoothing starts on row 0.
/// Rows before `period` observations are NaN. Values range 0-100:
/// - Below 30: oversold
/// - Above 70: overbought
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Calculate the RSI series over candle closes.
    pub fn calculate(&self, candles: &[Candle]) -> Vec<f64> {
        let mut out = vec![f64::NAN; candles.len()];
        if self.period == 0 {
            return out;
        }

        let alpha = 1.0 / self.period as f64;
        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;

        for i in 0..candles.len() {
            let change = if i == 0 {
                0.0
            } else {
                candles[i].close - candles[i - 1].close
            };
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            if i == 0 {
                avg_gain = gain;
                avg_loss = loss;
            } else {
                avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
                avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
            }

            if i + 1 >= self.period {
                out[i] = if avg_loss == 0.0 {
                    100.0
                } else {
                    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
                };
            }
        }

        out
    }
}
