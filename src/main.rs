use smc_signals::config::Config;
use smc_signals::services::{LivePriceCache, PairsCache, ServiceDefaults, TradePlanService};
use smc_signals::sources::{BybitTickerWs, ExchangeRegistry, HttpFetcher};
use smc_signals::{api, AppState};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smc_signals=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env());
    info!(
        "Starting smc-signals (default exchange {}, EMA {}/{})",
        config.default_exchange, config.ema_short, config.ema_long
    );

    let http = HttpFetcher::new(config.http_timeout, config.http_max_retries);
    let pairs_cache = Arc::new(PairsCache::new(
        config.pairs_cache_dir.clone(),
        config.pairs_cache_ttl,
    ));
    let registry = ExchangeRegistry::with_all(config.default_exchange, http, pairs_cache.clone());

    let live_prices = LivePriceCache::new();
    let trade_plans = Arc::new(TradePlanService::new(
        registry,
        live_prices.clone(),
        ServiceDefaults::from(config.as_ref()),
    ));

    // Start the live ticker feed
    if !config.live_feed_symbols.is_empty() {
        let ws = BybitTickerWs::new(
            config.bybit_ws_url.clone(),
            &config.live_feed_symbols,
            live_prices.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = ws.connect().await {
                error!("Bybit ticker feed stopped: {}", e);
            }
        });
    } else {
        info!("Live price feed disabled");
    }

    let state = AppState {
        config: config.clone(),
        trade_plans,
        live_prices,
        pairs_cache,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::router()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("smc-signals listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
