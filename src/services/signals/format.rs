//! Result Formatter helpers: price formatting, insight text and the
//! plain-text plan rendering.

use std::fmt::Write;

use crate::types::{
    DirectionalResult, IndicatorSnapshot, Side, SignalReport, TradePlanResult,
};

/// Format a price with precision scaled to its magnitude.
///
/// - below 1: up to 8 decimals, trailing zeros trimmed
/// - below 10: 4 decimals
/// - below 1000: 3 decimals
/// - otherwise: 2 decimals
///
/// Missing or non-finite values render as `-`.
pub fn format_price_dynamic(value: Option<f64>) -> String {
    let x = match value {
        Some(x) if x.is_finite() => x,
        _ => return "-".to_string(),
    };

    let abs = x.abs();
    if abs < 1.0 {
        let fixed = format!("{:.8}", x);
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else if abs < 10.0 {
        format!("{:.4}", x)
    } else if abs < 1000.0 {
        format!("{:.3}", x)
    } else {
        format!("{:.2}", x)
    }
}

fn indicator_lines(snap: &IndicatorSnapshot) -> String {
    format!(
        "EMA short: {} • EMA long: {}\nMACD: {:.5} | Signal: {:.5}",
        format_price_dynamic(Some(snap.ema_short)),
        format_price_dynamic(Some(snap.ema_long)),
        snap.macd_line,
        snap.macd_signal,
    )
}

/// Insight text for a neutral result.
pub fn neutral_insight(snap: &IndicatorSnapshot) -> String {
    format!(
        "{}\nRSI: {:.2} | ATR: {:.4}\nNo clear EMA crossover or RSI too stretched. Range/consolidation.",
        indicator_lines(snap),
        snap.rsi,
        snap.atr,
    )
}

/// Insight text for a directional result, including the confidence reasons.
pub fn directional_insight(
    side: Side,
    snap: &IndicatorSnapshot,
    has_structure: bool,
    reasons: &[String],
) -> String {
    let structure = if has_structure { "Found" } else { "Not found" };
    let bias = match side {
        Side::Long => "EMA bullish",
        Side::Short => "EMA bearish",
    };

    let mut text = format!(
        "{}\nFVG/OB: {}\nSTOCH K/D: {}/{} | Vol xEMA20: {}\nRSI: {:.2} | ATR: {:.4}\n{} • Entry on FVG/OB retest when present.\n",
        indicator_lines(snap),
        structure,
        format_price_dynamic(snap.stoch_k),
        format_price_dynamic(snap.stoch_d),
        format_price_dynamic(snap.volume_ratio),
        snap.rsi,
        snap.atr,
        bias,
    );
    for reason in reasons {
        let _ = write!(text, "\n- {}", reason);
    }
    text
}

fn directional_text(report: &SignalReport, result: &DirectionalResult) -> String {
    let plan = &result.plan;
    format!(
        "DIRECTION: **{}**\nENTRY: {}\nSL: {}\nTP1: {}\nTP2: {}\nRR: {}\nCONFIDENCE: {}% {}\nLAST_PRICE: {}\nEXCHANGE: {}\nINSIGHT_START\n{}\nINSIGHT_END",
        plan.direction.as_str().to_uppercase(),
        format_price_dynamic(Some(plan.entry)),
        format_price_dynamic(Some(plan.stop_loss)),
        format_price_dynamic(Some(plan.tp1)),
        format_price_dynamic(Some(plan.tp2)),
        plan.risk_reward,
        plan.confidence,
        plan.confidence_label.label(),
        format_price_dynamic(Some(result.current_price)),
        report.exchange.label(),
        result.insight,
    )
}

/// Line-oriented plain-text rendering of a report.
pub fn format_plan_text(report: &SignalReport) -> String {
    match &report.result {
        TradePlanResult::Neutral(result) => format!(
            "DIRECTION: **NEUTRAL**\nLAST_PRICE: {}\nEXCHANGE: {}\nINSIGHT_START\n{}\nINSIGHT_END",
            format_price_dynamic(Some(result.current_price)),
            report.exchange.label(),
            result.insight,
        ),
        TradePlanResult::Directional(result) => directional_text(report, result),
    }
}
