//! Runtime wiring: backfill, schedulers and the paper sink working together.

use rust_decimal_macros::dec;
use stalker::config::AppConfig;
use stalker::core::runtime::TradingRuntime;
use stalker::models::bar::SeriesKey;
use stalker::models::interval::Interval;
use stalker::services::market_data::{MarketDataSource, OrderSink};
use stalker::services::paper::PaperOrderSink;
use std::sync::Arc;

use crate::test_utils::{capitulation_bars, MockMarketData};

fn config(journal_dir: &std::path::Path) -> AppConfig {
    AppConfig {
        symbols: vec!["BTCUSDT".to_string()],
        intervals: vec![Interval::OneMinute],
        journal_dir: journal_dir.to_path_buf(),
        ..AppConfig::default()
    }
}

fn runtime(dir: &tempfile::TempDir) -> (TradingRuntime, Arc<PaperOrderSink>) {
    let source = Arc::new(MockMarketData::new());
    source.set_bars("BTCUSDT", Interval::OneMinute, capitulation_bars());
    source.set_price("BTCUSDT", dec!(76));

    let source: Arc<dyn MarketDataSource> = source;
    let paper = Arc::new(PaperOrderSink::new(source.clone(), dec!(100)));
    let sink: Arc<dyn OrderSink> = paper.clone();
    (TradingRuntime::new(config(dir.path()), source, sink), paper)
}

#[tokio::test]
async fn start_backfills_and_stop_halts_schedulers() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, _) = runtime(&dir);
    assert!(!runtime.is_running().await);

    runtime.start().await.expect("runtime starts");
    assert!(runtime.is_running().await);
    assert_eq!(
        runtime
            .store()
            .len(&SeriesKey::new("BTCUSDT", Interval::OneMinute))
            .await,
        100
    );

    runtime.stop().await;
    assert!(!runtime.is_running().await);
}

#[tokio::test]
async fn tick_trades_through_the_paper_sink() {
    let dir = tempfile::tempdir().unwrap();
    let (runtime, paper) = runtime(&dir);

    let backfill = runtime.backfill().await;
    assert_eq!(backfill.appended, 100);

    let report = runtime.orchestrator().tick().await;
    assert_eq!(report.placed, vec!["paper-1".to_string()]);
    assert_eq!(paper.orders().await.len(), 1);
    assert!(dir.path().join("BTCUSDT_trades.jsonl").exists());
}

#[tokio::test]
async fn zero_interval_fails_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let source: Arc<dyn MarketDataSource> = Arc::new(MockMarketData::new());
    let sink: Arc<dyn OrderSink> = Arc::new(PaperOrderSink::new(source.clone(), dec!(100)));

    let mut config = config(dir.path());
    config.schedule.evaluation_interval_seconds = 0;
    let runtime = TradingRuntime::new(config, source, sink);

    assert!(runtime.start().await.is_err());
    assert!(!runtime.is_running().await);
}

#[tokio::test]
async fn second_start_is_ignored_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(MockMarketData::new());
    source.set_bars("BTCUSDT", Interval::OneMinute, capitulation_bars());
    let dyn_source: Arc<dyn MarketDataSource> = source.clone();
    let sink: Arc<dyn OrderSink> = Arc::new(PaperOrderSink::new(dyn_source.clone(), dec!(100)));

    let mut config = config(dir.path());
    config.schedule.refresh_interval_seconds = 1_800;
    config.schedule.evaluation_interval_seconds = 1_800;
    let runtime = TradingRuntime::new(config, dyn_source, sink);

    runtime.start().await.expect("runtime starts");
    let fetches = source.fetch_count();
    assert_eq!(fetches, 1);

    runtime.start().await.expect("second start is a no-op");
    assert_eq!(source.fetch_count(), fetches);

    runtime.stop().await;
    assert!(!runtime.is_running().await);

    runtime.start().await.expect("restart after stop");
    assert_eq!(source.fetch_count(), fetches + 1);
    assert!(runtime.is_running().await);
    runtime.stop().await;
}
