//! smc-signals - Crypto futures trade signals from indicators and market structure

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use std::sync::Arc;

use config::Config;
use services::{LivePriceCache, PairsCache, TradePlanService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub trade_plans: Arc<TradePlanService>,
    pub live_prices: Arc<LivePriceCache>,
    pub pairs_cache: Arc<PairsCache>,
}

// Re-export commonly used types
pub use error::{AppError, Result, SignalError};
pub use services::signals::{generate_trade_plan, PlanParams};
pub use types::*;
