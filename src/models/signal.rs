use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalDirection {
    StrongBuy,
    Buy,
    Sell,
    StrongSell,
    Hold,
}

impl SignalDirection {
    pub fn is_actionable(self) -> bool {
        !matches!(self, Self::Hold)
    }
}

/// A directional opinion about one (symbol, interval).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub interval: Interval,
    pub direction: SignalDirection,
    pub reference_price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Signal {
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        direction: SignalDirection,
        reference_price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            direction,
            reference_price,
            timestamp,
        }
    }
}

/// Candlestick reversal classification of the newest bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternResult {
    BullishReversal,
    BearishReversal,
    None,
}
