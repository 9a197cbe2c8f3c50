//! MACD (Moving Average Convergence Divergence) indicator.

use super::Ema;

/// MACD indicator.
///
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD line and signal line, row-aligned with the input.
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
}

impl Macd {
    /// Calculate MACD and signal lines over closing prices.
    ///
    /// The line is NaN until the slow EMA is defined; the signal line starts
    /// from the first defined MACD value and needs `signal_period` of them.
    pub fn calculate(&self, closes: &[f64]) -> MacdSeries {
        let fast = Ema::new(self.fast_period).calculate(closes);
        let slow = Ema::new(self.slow_period).calculate(closes);

        let line: Vec<f64> = fast
            .iter()
            .zip(slow.iter())
            .map(|(f, s)| f - s)
            .collect();
        let signal = Ema::new(self.signal_period).calculate(&line);

        MacdSeries { line, signal }
    }
}
