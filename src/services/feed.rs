//! Data feed adapter: pulls candles from the market data source into the bar store

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::bar_store::{AppendOutcome, BarStore};
use crate::error::{Result, StalkerError};
use crate::models::bar::{Bar, SeriesKey};
use crate::services::market_data::MarketDataSource;

/// Receives every bar the feed actually appended (push path).
///
/// Called while the series is locked, so implementations must not block.
pub trait BarObserver: Send + Sync {
    fn on_bar(&self, key: &SeriesKey, bar: &Bar);
}

/// Outcome of a feed pass over several series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedReport {
    pub appended: usize,
    pub ignored: usize,
    pub failed: Vec<SeriesKey>,
}

impl FeedReport {
    fn absorb(&mut self, key: &SeriesKey, result: Result<(usize, usize)>) {
        match result {
            Ok((appended, ignored)) => {
                self.appended += appended;
                self.ignored += ignored;
            }
            Err(_) => self.failed.push(key.clone()),
        }
    }
}

pub struct DataFeed {
    source: Arc<dyn MarketDataSource>,
    store: Arc<BarStore>,
    observers: Vec<Arc<dyn BarObserver>>,
    keys: Vec<SeriesKey>,
    backfill_limit: usize,
    fetch_timeout: Duration,
}

impl DataFeed {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        store: Arc<BarStore>,
        keys: Vec<SeriesKey>,
        backfill_limit: usize,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            source,
            store,
            observers: Vec::new(),
            keys,
            backfill_limit: backfill_limit.max(1),
            fetch_timeout,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn BarObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn keys(&self) -> &[SeriesKey] {
        &self.keys
    }

    /// One pull of the most recent bars for every tracked series.
    pub async fn backfill(&self) -> FeedReport {
        let results = join_all(self.keys.iter().map(|key| self.pull(key, None))).await;
        let report = self.collect(results);
        info!(
            series = self.keys.len(),
            appended = report.appended,
            failed = report.failed.len(),
            "DataFeed: backfill finished, {} bars across {} series",
            report.appended,
            self.keys.len()
        );
        report
    }

    /// Pull bars newer than the stored newest bar for every tracked series.
    pub async fn refresh_all(&self) -> FeedReport {
        let results = join_all(self.keys.iter().map(|key| self.refresh(key))).await;
        let report = self.collect(results);
        debug!(
            appended = report.appended,
            ignored = report.ignored,
            failed = report.failed.len(),
            "DataFeed: refresh finished"
        );
        report
    }

    /// Refresh only the series belonging to `symbol`.
    pub async fn refresh_symbol(&self, symbol: &str) -> FeedReport {
        let keys: Vec<&SeriesKey> = self.keys.iter().filter(|k| k.symbol == symbol).collect();
        let results = join_all(keys.iter().map(|key| self.refresh(key))).await;
        let mut report = FeedReport::default();
        for (key, result) in keys.into_iter().zip(results) {
            report.absorb(key, result);
        }
        report
    }

    /// Returns `(appended, ignored)` for one series.
    pub async fn refresh(&self, key: &SeriesKey) -> Result<(usize, usize)> {
        let since = self.store.newest_timestamp(key).await;
        if since.is_none() {
            debug!(series = %key, "DataFeed: no bars stored yet for {}, backfilling", key);
        }
        self.pull(key, since).await
    }

    async fn pull(&self, key: &SeriesKey, since: Option<DateTime<Utc>>) -> Result<(usize, usize)> {
        let fetch = self
            .source
            .fetch_bars(&key.symbol, key.interval, since, self.backfill_limit);
        let bars = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(bars)) => bars,
            Ok(Err(e)) => {
                warn!(series = %key, error = %e, "DataFeed: fetch failed for {}", key);
                return Err(e);
            }
            Err(_) => {
                let e = StalkerError::Timeout {
                    operation: format!("fetch_bars {}", key),
                    after_ms: self.fetch_timeout.as_millis() as u64,
                };
                warn!(series = %key, error = %e, "DataFeed: fetch timed out for {}", key);
                return Err(e);
            }
        };
        Ok(self.ingest(key, bars).await)
    }

    /// Append bars oldest-first, notifying observers of each new bar.
    pub async fn ingest(&self, key: &SeriesKey, mut bars: Vec<Bar>) -> (usize, usize) {
        bars.sort_by_key(|bar| bar.timestamp);

        let mut appended = 0;
        let mut ignored = 0;
        for bar in bars {
            let outcome = self
                .store
                .append_with(key, bar, |stored| {
                    for observer in &self.observers {
                        observer.on_bar(key, stored);
                    }
                })
                .await;
            match outcome {
                AppendOutcome::Appended => appended += 1,
                AppendOutcome::Ignored => ignored += 1,
            }
        }

        if appended > 0 {
            debug!(
                series = %key,
                appended = appended,
                ignored = ignored,
                "DataFeed: appended {} bars to {}",
                appended,
                key
            );
        }
        (appended, ignored)
    }

    fn collect(&self, results: Vec<Result<(usize, usize)>>) -> FeedReport {
        let mut report = FeedReport::default();
        for (key, result) in self.keys.iter().zip(results) {
            report.absorb(key, result);
        }
        report
    }
}
