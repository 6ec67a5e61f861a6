//! Wires the pipeline together and drives it from three schedulers

use futures_util::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::orchestrator::{Orchestrator, SymbolPipeline};
use super::scheduler::{Job, JobScheduler};
use crate::cache::bar_store::BarStore;
use crate::config::AppConfig;
use crate::db::journal::SignalJournal;
use crate::error::Result;
use crate::indicators::engine::IndicatorEngine;
use crate::models::bar::SeriesKey;
use crate::patterns::pin_bar::PinBarDetector;
use crate::risk::sizer::RiskSizer;
use crate::services::feed::{DataFeed, FeedReport};
use crate::services::market_data::{MarketDataSource, OrderSink};
use crate::signals::fusion::SignalFuser;
use crate::trading::monitor::TradeMonitor;

pub struct TradingRuntime {
    config: AppConfig,
    store: Arc<BarStore>,
    feed: Arc<DataFeed>,
    orchestrator: Arc<Orchestrator>,
    schedulers: RwLock<Vec<JobScheduler>>,
}

impl TradingRuntime {
    pub fn new(
        config: AppConfig,
        source: Arc<dyn MarketDataSource>,
        sink: Arc<dyn OrderSink>,
    ) -> Self {
        let store = Arc::new(BarStore::new(config.store.retention_cap));
        let engine = Arc::new(IndicatorEngine::new(config.indicators.clone()));

        let keys: Vec<SeriesKey> = config
            .symbols
            .iter()
            .flat_map(|symbol| config.intervals.iter().map(move |i| SeriesKey::new(symbol.clone(), *i)))
            .collect();
        let feed = Arc::new(
            DataFeed::new(
                source,
                store.clone(),
                keys,
                config.store.backfill_limit,
                Duration::from_millis(config.schedule.fetch_timeout_ms),
            )
            .with_observer(engine.clone()),
        );

        let pipeline = SymbolPipeline {
            store: store.clone(),
            feed: feed.clone(),
            engine,
            patterns: PinBarDetector::new(config.patterns.clone()),
            fuser: SignalFuser::new(config.fusion.clone()),
            intervals: config.intervals.clone(),
        };
        let orchestrator = Orchestrator::new(
            pipeline,
            RiskSizer::new(config.risk.clone()),
            TradeMonitor::new(config.monitor.clone()),
            sink,
            config.symbols.clone(),
            Duration::from_millis(config.schedule.order_timeout_ms),
        )
        .with_journal(Arc::new(SignalJournal::new(config.journal_dir.clone())));

        Self {
            config,
            store,
            feed,
            orchestrator: Arc::new(orchestrator),
            schedulers: RwLock::new(Vec::new()),
        }
    }

    pub fn store(&self) -> Arc<BarStore> {
        self.store.clone()
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        self.orchestrator.clone()
    }

    pub async fn backfill(&self) -> FeedReport {
        self.feed.backfill().await
    }

    /// Backfill once, then start the refresh, eviction and decision schedulers.
    ///
    /// A second call while the schedulers run is a no-op.
    pub async fn start(&self) -> Result<()> {
        let mut running = self.schedulers.write().await;
        for scheduler in running.iter() {
            if scheduler.is_running().await {
                warn!("TradingRuntime: already running, ignoring start");
                return Ok(());
            }
        }

        self.backfill().await;

        let schedule = &self.config.schedule;

        let feed = self.feed.clone();
        let refresh: Job = Arc::new(move || {
            let feed = feed.clone();
            async move {
                feed.refresh_all().await;
            }
            .boxed()
        });

        let store = self.store.clone();
        let evict: Job = Arc::new(move || {
            let store = store.clone();
            async move {
                store.evict().await;
            }
            .boxed()
        });

        let orchestrator = self.orchestrator.clone();
        let tick: Job = Arc::new(move || {
            let orchestrator = orchestrator.clone();
            async move {
                orchestrator.tick().await;
            }
            .boxed()
        });

        let schedulers = vec![
            JobScheduler::new("bar-refresh", schedule.refresh_interval_seconds, refresh)?,
            JobScheduler::new("eviction", schedule.eviction_interval_seconds, evict)?,
            JobScheduler::new("decision-tick", schedule.evaluation_interval_seconds, tick)?,
        ];
        for scheduler in &schedulers {
            scheduler.start().await;
        }
        *running = schedulers;

        info!(
            symbols = ?self.config.symbols,
            intervals = ?self.config.intervals,
            "TradingRuntime: started"
        );
        Ok(())
    }

    pub async fn stop(&self) {
        for scheduler in self.schedulers.read().await.iter() {
            scheduler.stop().await;
        }
        info!("TradingRuntime: stopped");
    }

    pub async fn is_running(&self) -> bool {
        for scheduler in self.schedulers.read().await.iter() {
            if scheduler.is_running().await {
                return true;
            }
        }
        false
    }
}
