use super::{Candle, Exchange, Timeframe};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a directional trade plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Parse `long` / `short` (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "long" => Some(Side::Long),
            "short" => Some(Side::Short),
            _ => None,
        }
    }

    /// +1 for long, -1 for short. Multiplies distances that point "with" the trade.
    pub fn sign(&self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

/// Resolved direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
    Neutral,
}

impl Direction {
    /// The trade side, or `None` for neutral.
    pub fn side(&self) -> Option<Side> {
        match self {
            Direction::Long => Some(Side::Long),
            Direction::Short => Some(Side::Short),
            Direction::Neutral => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
            Direction::Neutral => "neutral",
        }
    }
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => Direction::Long,
            Side::Short => Direction::Short,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fair value gap polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FvgKind {
    Bullish,
    Bearish,
}

impl FvgKind {
    /// Gap polarity that supports a trade side.
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::Long => FvgKind::Bullish,
            Side::Short => FvgKind::Bearish,
        }
    }
}

/// Three-candle imbalance between candle `bar_index - 2` and `bar_index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fvg {
    pub kind: FvgKind,
    /// Upper edge of the gap.
    pub high: f64,
    /// Lower edge of the gap.
    pub low: f64,
    /// Midpoint of the gap.
    pub level: f64,
    /// Index of the third candle of the pattern.
    pub bar_index: usize,
}

/// Reference candle two bars before the relevant FVG.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBlock {
    pub high: f64,
    pub low: f64,
    pub bar_index: usize,
}

/// Bucketed trend strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendQuality {
    #[serde(rename = "WEAK")]
    Weak,
    #[serde(rename = "MODERATE")]
    Moderate,
    #[serde(rename = "STRONG")]
    Strong,
    #[serde(rename = "VERY STRONG")]
    VeryStrong,
}

impl TrendQuality {
    /// Bucket a 0..100 strength value.
    pub fn from_strength(strength: f64) -> Self {
        if strength < 30.0 {
            TrendQuality::Weak
        } else if strength < 50.0 {
            TrendQuality::Moderate
        } else if strength < 70.0 {
            TrendQuality::Strong
        } else {
            TrendQuality::VeryStrong
        }
    }

    pub fn is_weak(&self) -> bool {
        matches!(self, TrendQuality::Weak)
    }

    /// STRONG or VERY STRONG.
    pub fn is_strong(&self) -> bool {
        matches!(self, TrendQuality::Strong | TrendQuality::VeryStrong)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrendQuality::Weak => "WEAK",
            TrendQuality::Moderate => "MODERATE",
            TrendQuality::Strong => "STRONG",
            TrendQuality::VeryStrong => "VERY STRONG",
        }
    }
}

/// Trend strength computed from EMA slopes, separation and streak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendStrength {
    pub strength: f64,
    pub quality: TrendQuality,
}

impl TrendStrength {
    /// No measurable trend.
    pub fn none() -> Self {
        Self {
            strength: 0.0,
            quality: TrendQuality::Weak,
        }
    }
}

/// Divergence flags between price pivots and oscillators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Divergence {
    pub rsi_bullish: bool,
    pub rsi_bearish: bool,
    pub macd_bullish: bool,
    pub macd_bearish: bool,
}

impl Divergence {
    /// Whether any divergence flag points in the direction of `side`.
    pub fn supports(&self, side: Side) -> bool {
        match side {
            Side::Long => self.rsi_bullish || self.macd_bullish,
            Side::Short => self.rsi_bearish || self.macd_bearish,
        }
    }
}

/// Per-candle indicator values. Rows without enough history hold NaN
/// (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSeries {
    pub ema_short: Vec<f64>,
    pub ema_long: Vec<f64>,
    pub rsi: Vec<f64>,
    pub atr: Vec<f64>,
    pub macd_line: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub stoch_k: Vec<f64>,
    pub stoch_d: Vec<f64>,
    pub vol_ema20: Vec<f64>,
}

impl IndicatorSeries {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.ema_short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ema_short.is_empty()
    }
}

/// Last-row indicator values as consumed by the decision logic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub ema_short: f64,
    pub ema_long: f64,
    pub rsi: f64,
    /// ATR after the zero/NaN floor has been applied.
    pub atr: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub volume: f64,
    pub volume_ema20: Option<f64>,
    pub volume_ratio: Option<f64>,
}

/// Confidence bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "VERY LOW")]
    VeryLow,
}

impl ConfidenceLabel {
    /// Bucket a 0..100 score at 80/60/40.
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 80 => ConfidenceLabel::High,
            s if s >= 60 => ConfidenceLabel::Medium,
            s if s >= 40 => ConfidenceLabel::Low,
            _ => ConfidenceLabel::VeryLow,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLabel::High => "HIGH",
            ConfidenceLabel::Medium => "MEDIUM",
            ConfidenceLabel::Low => "LOW",
            ConfidenceLabel::VeryLow => "VERY LOW",
        }
    }
}

/// Entry, stop and targets for a directional signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePlan {
    pub direction: Side,
    pub entry: f64,
    pub stop_loss: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub risk_reward: f64,
    pub confidence: u8,
    pub confidence_label: ConfidenceLabel,
    pub reasons: Vec<String>,
}

impl TradePlan {
    /// Distance between entry and stop.
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }
}

/// Result when no trade is proposed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NeutralResult {
    pub direction: Direction,
    pub current_price: f64,
    pub snapshot: IndicatorSnapshot,
    pub trend: TrendStrength,
    pub divergence: Divergence,
    pub insight: String,
    pub candles: Vec<Candle>,
    pub indicators: IndicatorSeries,
}

/// Result carrying a full trade plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalResult {
    pub direction: Direction,
    pub plan: TradePlan,
    pub current_price: f64,
    pub snapshot: IndicatorSnapshot,
    pub trend: TrendStrength,
    pub divergence: Divergence,
    pub fvgs: Vec<Fvg>,
    pub relevant_fvg: Option<Fvg>,
    pub order_block: Option<OrderBlock>,
    pub insight: String,
    pub candles: Vec<Candle>,
    pub indicators: IndicatorSeries,
}

/// Output of the signal pipeline. Callers branch on the variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TradePlanResult {
    Neutral(NeutralResult),
    Directional(DirectionalResult),
}

impl TradePlanResult {
    pub fn direction(&self) -> Direction {
        match self {
            TradePlanResult::Neutral(_) => Direction::Neutral,
            TradePlanResult::Directional(r) => r.direction,
        }
    }

    /// The trade plan, if the result is directional.
    pub fn plan(&self) -> Option<&TradePlan> {
        match self {
            TradePlanResult::Neutral(_) => None,
            TradePlanResult::Directional(r) => Some(&r.plan),
        }
    }

    pub fn current_price(&self) -> f64 {
        match self {
            TradePlanResult::Neutral(r) => r.current_price,
            TradePlanResult::Directional(r) => r.current_price,
        }
    }

    pub fn snapshot(&self) -> &IndicatorSnapshot {
        match self {
            TradePlanResult::Neutral(r) => &r.snapshot,
            TradePlanResult::Directional(r) => &r.snapshot,
        }
    }

    pub fn insight(&self) -> &str {
        match self {
            TradePlanResult::Neutral(r) => &r.insight,
            TradePlanResult::Directional(r) => &r.insight,
        }
    }
}

/// Signal for a symbol on an exchange, as served to presentation layers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalReport {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub exchange: Exchange,
    /// Whether `current_price` came from the live feed rather than the last close.
    pub live_price: bool,
    /// Unix timestamp (milliseconds) when generated.
    pub generated_at: i64,
    pub result: TradePlanResult,
}
