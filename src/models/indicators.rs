use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaIndicator {
    pub value: Decimal,
    pub period: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsiIndicator {
    pub value: Decimal,
    pub period: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CciIndicator {
    pub value: Decimal,
    pub period: u32,
}

/// Bullish/bearish divergence flags for one oscillator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    pub bullish: bool,
    pub bearish: bool,
}

/// Indicator readings at the newest bar of a series.
///
/// Always recomputed from a series snapshot; never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub interval: Interval,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub sma: SmaIndicator,
    pub rsi: RsiIndicator,
    pub cci: CciIndicator,
    pub rsi_divergence: Divergence,
    pub cci_divergence: Divergence,
}

impl IndicatorSnapshot {
    pub fn is_price_above_sma(&self) -> bool {
        self.price > self.sma.value
    }
}
