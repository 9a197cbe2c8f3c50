use serde::{Deserialize, Serialize};
use std::fmt;

/// Candle interval accepted by the signal pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1M")]
    OneMonth,
}

impl Timeframe {
    /// Every supported timeframe, shortest first.
    pub const ALL: [Timeframe; 12] = [
        Timeframe::OneMinute,
        Timeframe::ThreeMinutes,
        Timeframe::FiveMinutes,
        Timeframe::FifteenMinutes,
        Timeframe::ThirtyMinutes,
        Timeframe::OneHour,
        Timeframe::TwoHours,
        Timeframe::FourHours,
        Timeframe::SixHours,
        Timeframe::OneDay,
        Timeframe::OneWeek,
        Timeframe::OneMonth,
    ];

    /// Parse a timeframe string.
    ///
    /// `1M` (uppercase) is one month; everything else is matched
    /// case-insensitively, so `1H` and `1h` are both one hour.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        if s == "1M" {
            return Some(Timeframe::OneMonth);
        }
        match s.to_lowercase().as_str() {
            "1m" => Some(Timeframe::OneMinute),
            "3m" => Some(Timeframe::ThreeMinutes),
            "5m" => Some(Timeframe::FiveMinutes),
            "15m" => Some(Timeframe::FifteenMinutes),
            "30m" => Some(Timeframe::ThirtyMinutes),
            "1h" => Some(Timeframe::OneHour),
            "2h" => Some(Timeframe::TwoHours),
            "4h" => Some(Timeframe::FourHours),
            "6h" => Some(Timeframe::SixHours),
            "1d" => Some(Timeframe::OneDay),
            "1w" => Some(Timeframe::OneWeek),
            "1mo" => Some(Timeframe::OneMonth),
            _ => None,
        }
    }

    /// Canonical string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1m",
            Timeframe::ThreeMinutes => "3m",
            Timeframe::FiveMinutes => "5m",
            Timeframe::FifteenMinutes => "15m",
            Timeframe::ThirtyMinutes => "30m",
            Timeframe::OneHour => "1h",
            Timeframe::TwoHours => "2h",
            Timeframe::FourHours => "4h",
            Timeframe::SixHours => "6h",
            Timeframe::OneDay => "1d",
            Timeframe::OneWeek => "1w",
            Timeframe::OneMonth => "1M",
        }
    }

    /// Length of one candle in milliseconds (a month counts as 30 days).
    pub fn duration_ms(&self) -> i64 {
        const MINUTE: i64 = 60_000;
        match self {
            Timeframe::OneMinute => MINUTE,
            Timeframe::ThreeMinutes => 3 * MINUTE,
            Timeframe::FiveMinutes => 5 * MINUTE,
            Timeframe::FifteenMinutes => 15 * MINUTE,
            Timeframe::ThirtyMinutes => 30 * MINUTE,
            Timeframe::OneHour => 60 * MINUTE,
            Timeframe::TwoHours => 120 * MINUTE,
            Timeframe::FourHours => 240 * MINUTE,
            Timeframe::SixHours => 360 * MINUTE,
            Timeframe::OneDay => 1_440 * MINUTE,
            Timeframe::OneWeek => 10_080 * MINUTE,
            Timeframe::OneMonth => 43_200 * MINUTE,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One OHLC candle. Series are always ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    /// Open time, unix milliseconds.
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}
