//! Stalker Worker
//!
//! Keeps the candle cache warm, evaluates signals on a schedule and follows
//! open trades until they exit. Runs against the paper order sink.

use dotenvy::dotenv;
use stalker::config::{self, AppConfig};
use stalker::core::runtime::TradingRuntime;
use stalker::logging;
use stalker::services::bybit::BybitMarketData;
use stalker::services::market_data::{MarketDataSource, OrderSink};
use stalker::services::paper::PaperOrderSink;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let env = config::get_environment();
    info!("Starting Stalker Worker");
    info!(environment = %env, "Environment");

    let app_config = AppConfig::from_env()?;
    app_config.validate()?;

    let source: Arc<dyn MarketDataSource> = Arc::new(BybitMarketData::new(config::get_bybit_base_url()));
    let sink: Arc<dyn OrderSink> = Arc::new(PaperOrderSink::new(source.clone(), app_config.paper_balance));

    info!(
        symbols = ?app_config.symbols,
        intervals = ?app_config.intervals,
        paper_balance = %app_config.paper_balance,
        "Worker configuration loaded"
    );

    let runtime = TradingRuntime::new(app_config, source, sink);
    runtime.start().await?;

    info!("Worker running. Press Ctrl+C to stop.");
    signal::ctrl_c().await?;

    info!("Shutting down worker...");
    runtime.stop().await;
    Ok(())
}
