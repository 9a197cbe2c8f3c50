//! Serialization and parsing tests for the public domain types.

use smc_signals::{
    Candle, ConfidenceLabel, Direction, Divergence, Exchange, Fvg, FvgKind, Side, Timeframe,
    TrendQuality,
};

// ============================================================================
// Timeframe
// ============================================================================

#[test]
fn test_timeframe_parsing() {
    assert_eq!(Timeframe::from_str("1h"), Some(Timeframe::OneHour));
    assert_eq!(Timeframe::from_str("1H"), Some(Timeframe::OneHour));
    assert_eq!(Timeframe::from_str(" 15m "), Some(Timeframe::FifteenMinutes));
    assert_eq!(Timeframe::from_str("1M"), Some(Timeframe::OneMonth));
    assert_eq!(Timeframe::from_str("1m"), Some(Timeframe::OneMinute));
    assert_eq!(Timeframe::from_str("7m"), None);
    assert_eq!(Timeframe::from_str(""), None);
}

#[test]
fn test_timeframe_round_trips_through_str() {
    for tf in Timeframe::ALL {
        assert_eq!(Timeframe::from_str(tf.as_str()), Some(tf));
        assert_eq!(tf.to_string(), tf.as_str());
    }
}

#[test]
fn test_timeframe_serialization() {
    assert_eq!(serde_json::to_string(&Timeframe::FourHours).unwrap(), "\"4h\"");
    assert_eq!(serde_json::to_string(&Timeframe::OneMonth).unwrap(), "\"1M\"");
    let tf: Timeframe = serde_json::from_str("\"1d\"").unwrap();
    assert_eq!(tf, Timeframe::OneDay);
}

#[test]
fn test_timeframe_durations_increase() {
    let durations: Vec<i64> = Timeframe::ALL.iter().map(|t| t.duration_ms()).collect();
    assert!(durations.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(Timeframe::OneHour.duration_ms(), 3_600_000);
}

// ============================================================================
// Exchange
// ============================================================================

#[test]
fn test_exchange_parsing() {
    assert_eq!(Exchange::from_str("BYBIT"), Some(Exchange::Bybit));
    assert_eq!(Exchange::from_str("gateio"), Some(Exchange::Gate));
    assert_eq!(Exchange::from_str("kraken"), None);
    assert_eq!(Exchange::default(), Exchange::Bybit);
}

#[test]
fn test_exchange_serialization() {
    assert_eq!(serde_json::to_string(&Exchange::Binance).unwrap(), "\"binance\"");
    assert_eq!(Exchange::Bitget.label(), "BITGET");
}

// ============================================================================
// Directions and labels
// ============================================================================

#[test]
fn test_side_and_direction() {
    assert_eq!(Side::from_str("Long"), Some(Side::Long));
    assert_eq!(Side::from_str("neutral"), None);
    assert_eq!(Direction::from(Side::Short), Direction::Short);
    assert_eq!(Direction::Neutral.side(), None);
    assert_eq!(serde_json::to_string(&Direction::Neutral).unwrap(), "\"neutral\"");
}

#[test]
fn test_trend_quality_buckets() {
    assert_eq!(TrendQuality::from_strength(0.0), TrendQuality::Weak);
    assert_eq!(TrendQuality::from_strength(29.99), TrendQuality::Weak);
    assert_eq!(TrendQuality::from_strength(30.0), TrendQuality::Moderate);
    assert_eq!(TrendQuality::from_strength(50.0), TrendQuality::Strong);
    assert_eq!(TrendQuality::from_strength(70.0), TrendQuality::VeryStrong);
    assert_eq!(
        serde_json::to_string(&TrendQuality::VeryStrong).unwrap(),
        "\"VERY STRONG\""
    );
}

#[test]
fn test_confidence_label_buckets() {
    assert_eq!(ConfidenceLabel::from_score(100), ConfidenceLabel::High);
    assert_eq!(ConfidenceLabel::from_score(80), ConfidenceLabel::High);
    assert_eq!(ConfidenceLabel::from_score(79), ConfidenceLabel::Medium);
    assert_eq!(ConfidenceLabel::from_score(60), ConfidenceLabel::Medium);
    assert_eq!(ConfidenceLabel::from_score(40), ConfidenceLabel::Low);
    assert_eq!(ConfidenceLabel::from_score(39), ConfidenceLabel::VeryLow);
    assert_eq!(ConfidenceLabel::VeryLow.label(), "VERY LOW");
}

#[test]
fn test_divergence_supports() {
    let div = Divergence {
        macd_bearish: true,
        ..Divergence::default()
    };
    assert!(div.supports(Side::Short));
    assert!(!div.supports(Side::Long));
}

// ============================================================================
// Structures
// ============================================================================

#[test]
fn test_candle_serialization() {
    let candle = Candle {
        open_time: 1_700_000_000_000,
        open: 100.0,
        high: 101.0,
        low: 99.0,
        close: 100.5,
        volume: 12.5,
    };
    let json = serde_json::to_value(candle).unwrap();
    assert_eq!(json["openTime"], 1_700_000_000_000i64);
    assert_eq!(json["close"], 100.5);

    let back: Candle = serde_json::from_value(json).unwrap();
    assert_eq!(back, candle);
}

#[test]
fn test_fvg_serialization() {
    let fvg = Fvg {
        kind: FvgKind::Bullish,
        high: 105.0,
        low: 100.0,
        level: 102.5,
        bar_index: 7,
    };
    let json = serde_json::to_value(fvg).unwrap();
    assert_eq!(json["kind"], "Bullish");
    assert_eq!(json["barIndex"], 7);
    assert_eq!(FvgKind::for_side(Side::Short), FvgKind::Bearish);
}
