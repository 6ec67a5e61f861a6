//! Shared data models spanning the engine layers.

pub mod bar;
pub mod indicators;
pub mod interval;
pub mod signal;
pub mod trade;

pub use bar::{Bar, Series, SeriesKey};
pub use indicators::{CciIndicator, Divergence, IndicatorSnapshot, RsiIndicator, SmaIndicator};
pub use interval::Interval;
pub use signal::{PatternResult, Signal, SignalDirection};
pub use trade::{
    ActiveTrade, Conviction, ExitReason, OrderRequest, OriginKind, RiskClass, SizedTrade,
    TradeDirection, TradeProposal, TradeState,
};
