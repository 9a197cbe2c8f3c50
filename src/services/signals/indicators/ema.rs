//! Exponential Moving Average (EMA).

/// EMA with smoothing factor `2 / (period + 1)`.
///
/// The recursion is seeded with the first value. Output rows before
/// `min_periods` observations are NaN; NaN inputs are skipped and produce NaN.
pub struct Ema {
    period: usize,
    min_periods: usize,
}

impl Ema {
    /// EMA masked until `period` observations are available.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            min_periods: period,
        }
    }

    /// EMA defined from the very first observation.
    pub fn without_warmup(period: usize) -> Self {
        Self {
            period,
            min_periods: 1,
        }
    }

    fn multiplier(&self) -> f64 {
        2.0 / (self.period as f64 + 1.0)
    }

    /// Calculate the EMA series over `values`.
    pub fn calculate(&self, values: &[f64]) -> Vec<f64> {
        let multiplier = self.multiplier();
        let mut out = Vec::with_capacity(values.len());
        let mut prev: Option<f64> = None;
        let mut seen = 0usize;

        for &value in values {
            if value.is_nan() {
                out.push(f64::NAN);
                continue;
            }
            seen += 1;
            let ema = match prev {
                Some(p) => (value - p) * multiplier + p,
                None => value,
            };
            prev = Some(ema);
            out.push(if seen >= self.min_periods { ema } else { f64::NAN });
        }

        out
    }
}
