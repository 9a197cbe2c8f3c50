//! Volume moving average.

use super::Ema;
use crate::types::Candle;

/// 20-period volume EMA, defined from the first candle.
pub struct VolumeEma {
    period: usize,
}

impl Default for VolumeEma {
    fn default() -> Self {
        Self { period: 20 }
    }
}

impl VolumeEma {
    pub fn calculate(&self, candles: &[Candle]) -> Vec<f64> {
        let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
        Ema::without_warmup(self.period).calculate(&volumes)
    }
}
