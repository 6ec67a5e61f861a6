//! Boundaries to the exchange: market data source and order sink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::bar::Bar;
use crate::models::interval::Interval;
use crate::models::trade::OrderRequest;

#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `limit` bars, optionally starting at `since`.
    ///
    /// Results may be empty, partial, overlapping with bars already seen, and
    /// in either time order.
    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: Interval,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Bar>>;

    /// Get the latest traded or mark price for a symbol
    async fn latest_price(&self, symbol: &str) -> Result<Decimal>;
}

#[async_trait]
pub trait OrderSink: Send + Sync {
    /// Submit a limit order and return the exchange-assigned order id.
    async fn place_order(&self, order: &OrderRequest) -> Result<String>;

    async fn current_price(&self, symbol: &str) -> Result<Decimal>;

    /// Available account balance in the settlement currency.
    async fn balance(&self) -> Result<Decimal>;
}
