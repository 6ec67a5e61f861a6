//! Candles and per-(symbol, interval) series snapshots

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use super::interval::Interval;

/// One OHLCV candle. `timestamp` is the start of the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub turnover: Decimal,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            turnover: Decimal::ZERO,
        }
    }

    /// Typical price `(high + low + close) / 3`.
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }

    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    pub fn upper_shadow(&self) -> Decimal {
        self.high - self.open.max(self.close)
    }

    pub fn lower_shadow(&self) -> Decimal {
        self.open.min(self.close) - self.low
    }
}

/// Identity of one rolling history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub symbol: String,
    pub interval: Interval,
}

impl SeriesKey {
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
        }
    }
}

impl Display for SeriesKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.symbol, self.interval)
    }
}

/// Immutable, oldest-first copy of a bar history.
///
/// Timestamps are strictly increasing; construction drops any bar that would
/// break that ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    key: SeriesKey,
    bars: Vec<Bar>,
}

impl Series {
    pub fn new(key: SeriesKey, bars: impl IntoIterator<Item = Bar>) -> Self {
        let mut ordered: Vec<Bar> = Vec::new();
        for bar in bars {
            match ordered.last() {
                Some(last) if bar.timestamp <= last.timestamp => continue,
                _ => ordered.push(bar),
            }
        }
        Self { key, bars: ordered }
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn symbol(&self) -> &str {
        &self.key.symbol
    }

    pub fn interval(&self) -> Interval {
        self.key.interval
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn newest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// The most recent `count` bars, oldest first.
    pub fn tail(&self, count: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(count);
        &self.bars[start..]
    }
}
