pub mod live_prices;
pub mod pairs_cache;
pub mod signals;
pub mod trade_plan;

pub use live_prices::{LivePriceCache, LivePriceView};
pub use pairs_cache::PairsCache;
pub use trade_plan::{ServiceDefaults, SignalRequest, TradePlanService};
