//! Canonical rolling bar history per (symbol, interval)
//!
//! Each series sits behind its own lock so appends, eviction and snapshots for
//! one key serialize against each other while different keys proceed
//! independently. Readers only ever receive owned [`Series`] copies.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::error::{Result, StalkerError};
use crate::models::bar::{Bar, Series, SeriesKey};

type SeriesBuffer = Arc<RwLock<VecDeque<Bar>>>;

/// Result of an append attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// Timestamp not newer than the current newest bar; nothing changed.
    Ignored,
}

pub struct BarStore {
    series: RwLock<HashMap<SeriesKey, SeriesBuffer>>,
    retention_cap: usize,
}

impl BarStore {
    pub fn new(retention_cap: usize) -> Self {
        Self {
            series: RwLock::new(HashMap::new()),
            retention_cap: retention_cap.max(1),
        }
    }

    pub fn retention_cap(&self) -> usize {
        self.retention_cap
    }

    async fn buffer(&self, key: &SeriesKey) -> Option<SeriesBuffer> {
        self.series.read().await.get(key).cloned()
    }

    async fn buffer_or_insert(&self, key: &SeriesKey) -> SeriesBuffer {
        if let Some(buffer) = self.buffer(key).await {
            return buffer;
        }
        let mut map = self.series.write().await;
        map.entry(key.clone())
            .or_insert_with(|| Arc::new(RwLock::new(VecDeque::new())))
            .clone()
    }

    /// Insert `bar` if it is strictly newer than the newest stored bar.
    pub async fn append(&self, key: &SeriesKey, bar: Bar) -> AppendOutcome {
        self.append_with(key, bar, |_| {}).await
    }

    /// Like [`BarStore::append`], running `on_append` before the series lock is
    /// released. Callbacks for one key therefore see bars in stored order.
    pub async fn append_with<F>(&self, key: &SeriesKey, bar: Bar, on_append: F) -> AppendOutcome
    where
        F: FnOnce(&Bar),
    {
        let buffer = self.buffer_or_insert(key).await;
        let mut bars = buffer.write().await;
        match bars.back() {
            Some(newest) if bar.timestamp <= newest.timestamp => {
                trace!(
                    series = %key,
                    timestamp = %bar.timestamp,
                    newest = %newest.timestamp,
                    "BarStore: ignored stale or duplicate bar"
                );
                AppendOutcome::Ignored
            }
            _ => {
                bars.push_back(bar);
                on_append(&bar);
                AppendOutcome::Appended
            }
        }
    }

    /// Owned copy of the series, oldest first.
    ///
    /// Unknown keys and keys without bars are reported as `DataUnavailable`.
    pub async fn snapshot(&self, key: &SeriesKey) -> Result<Series> {
        let buffer = self.buffer(key).await.ok_or_else(|| no_data(key, "series not tracked"))?;
        let bars = buffer.read().await;
        if bars.is_empty() {
            return Err(no_data(key, "series is empty"));
        }
        Ok(Series::new(key.clone(), bars.iter().copied()))
    }

    pub async fn newest_timestamp(&self, key: &SeriesKey) -> Option<DateTime<Utc>> {
        let buffer = self.buffer(key).await?;
        let bars = buffer.read().await;
        bars.back().map(|bar| bar.timestamp)
    }

    pub async fn newest_bar(&self, key: &SeriesKey) -> Option<Bar> {
        let buffer = self.buffer(key).await?;
        let bars = buffer.read().await;
        bars.back().copied()
    }

    pub async fn len(&self, key: &SeriesKey) -> usize {
        match self.buffer(key).await {
            Some(buffer) => buffer.read().await.len(),
            None => 0,
        }
    }

    pub async fn keys(&self) -> Vec<SeriesKey> {
        let mut keys: Vec<SeriesKey> = self.series.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Truncate every series to the retention cap, dropping the oldest bars.
    /// Returns the number of bars removed.
    pub async fn evict(&self) -> usize {
        let buffers: Vec<(SeriesKey, SeriesBuffer)> = self
            .series
            .read()
            .await
            .iter()
            .map(|(key, buffer)| (key.clone(), buffer.clone()))
            .collect();

        let mut removed = 0;
        for (key, buffer) in buffers {
            let mut bars = buffer.write().await;
            let excess = bars.len().saturating_sub(self.retention_cap);
            if excess > 0 {
                bars.drain(..excess);
                removed += excess;
                debug!(
                    series = %key,
                    evicted = excess,
                    retained = bars.len(),
                    "BarStore: evicted {} bars from {}",
                    excess,
                    key
                );
            }
        }
        removed
    }
}

fn no_data(key: &SeriesKey, reason: &str) -> StalkerError {
    StalkerError::DataUnavailable {
        symbol: key.symbol.clone(),
        interval: key.interval.to_string(),
        reason: reason.to_string(),
    }
}
