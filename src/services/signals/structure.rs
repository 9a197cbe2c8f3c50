//! Market structure: fair value gaps, order blocks and swing points.

use crate::types::{Candle, Fvg, FvgKind, OrderBlock, Side};

/// Default lookback for the structural swing point.
pub const SWING_LOOKBACK: usize = 20;

/// Scan every candle triplet `(i-2, i-1, i)` for a fair value gap.
///
/// The middle candle is ignored. A bullish gap takes precedence when both
/// conditions could hold for one index, so each index yields at most one gap.
/// Gaps are returned in ascending `bar_index` order and may overlap.
pub fn detect_fvg(candles: &[Candle]) -> Vec<Fvg> {
    let mut gaps = Vec::new();

    for i in 2..candles.len() {
        let first = &candles[i - 2];
        let third = &candles[i];

        if third.low > first.high {
            gaps.push(Fvg {
                kind: FvgKind::Bullish,
                high: third.low,
                low: first.high,
                level: (third.low + first.high) / 2.0,
                bar_index: i,
            });
        } else if third.high < first.low {
            gaps.push(Fvg {
                kind: FvgKind::Bearish,
                high: first.low,
                low: third.high,
                level: (first.low + third.high) / 2.0,
                bar_index: i,
            });
        }
    }

    gaps
}

/// Pick the gap relevant to `side` and its order block.
///
/// The relevant gap is the one of matching polarity whose level is closest to
/// the last close (earliest wins on ties). The order block is the candle two
/// bars before that gap, when such a candle exists.
pub fn find_smc_levels(
    candles: &[Candle],
    fvgs: &[Fvg],
    side: Side,
) -> (Option<OrderBlock>, Option<Fvg>) {
    let last_close = match candles.last() {
        Some(c) => c.close,
        None => return (None, None),
    };
    let kind = FvgKind::for_side(side);

    let relevant = fvgs
        .iter()
        .filter(|f| f.kind == kind)
        .min_by(|a, b| {
            let da = (a.level - last_close).abs();
            let db = (b.level - last_close).abs();
            da.total_cmp(&db)
        })
        .copied();

    let order_block = relevant.and_then(|fvg| {
        let index = fvg.bar_index.checked_sub(2)?;
        candles.get(index).map(|c| OrderBlock {
            high: c.high,
            low: c.low,
            bar_index: index,
        })
    });

    (order_block, relevant)
}

/// Lowest low (long) or highest high (short) of the last `lookback` candles.
///
/// Returns `None` when fewer than `lookback` candles are available.
pub fn find_swing_point(candles: &[Candle], side: Side, lookback: usize) -> Option<f64> {
    if lookback == 0 || candles.len() < lookback {
        return None;
    }
    let window = &candles[candles.len() - lookback..];

    Some(match side {
        Side::Long => window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
        Side::Short => window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max),
    })
}

/// Most favourable price over the last `window` candles (whole series if shorter):
/// highest high for longs, lowest low for shorts.
pub fn recent_extreme(candles: &[Candle], side: Side, window: usize) -> Option<f64> {
    if candles.is_empty() {
        return None;
    }
    let start = candles.len().saturating_sub(window);
    let recent = &candles[start..];

    Some(match side {
        Side::Long => recent.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max),
        Side::Short => recent.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
    })
}
