use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported futures exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    #[default]
    Bybit,
    Bitget,
    Gate,
}

impl Exchange {
    /// Every supported exchange.
    pub const ALL: [Exchange; 4] = [
        Exchange::Binance,
        Exchange::Bybit,
        Exchange::Bitget,
        Exchange::Gate,
    ];

    /// Parse an exchange name.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Some(Exchange::Binance),
            "bybit" => Some(Exchange::Bybit),
            "bitget" => Some(Exchange::Bitget),
            "gate" | "gateio" | "gate.io" => Some(Exchange::Gate),
            _ => None,
        }
    }

    /// Lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
            Exchange::Bitget => "bitget",
            Exchange::Gate => "gate",
        }
    }

    /// Uppercase display label.
    pub fn label(&self) -> &'static str {
        match self {
            Exchange::Binance => "BINANCE",
            Exchange::Bybit => "BYBIT",
            Exchange::Bitget => "BITGET",
            Exchange::Gate => "GATE",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
