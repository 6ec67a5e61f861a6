use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::response::{decimal, parse_kline_row, BybitResponse, KlineResult, TickerResult};
use crate::error::{Result, StalkerError};
use crate::models::bar::Bar;
use crate::models::interval::Interval;
use crate::services::market_data::MarketDataSource;

/// Largest page the kline endpoint serves.
const MAX_KLINE_LIMIT: usize = 1000;

pub struct BybitMarketData {
    base_url: String,
    client: reqwest::Client,
    category: String,
}

impl BybitMarketData {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            category: "linear".to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| StalkerError::external(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StalkerError::external(operation, format!("HTTP {}", status)));
        }

        let envelope: BybitResponse<T> = response
            .json()
            .await
            .map_err(|e| StalkerError::external(operation, e))?;
        envelope.into_result(operation)
    }
}

#[async_trait]
impl MarketDataSource for BybitMarketData {
    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: Interval,
        since: Option<DateTime<Utc>>,
        limit: usize,
    ) -> Result<Vec<Bar>> {
        let mut query = vec![
            ("category", self.category.clone()),
            ("symbol", symbol.to_string()),
            ("interval", interval.exchange_code().to_string()),
            ("limit", limit.clamp(1, MAX_KLINE_LIMIT).to_string()),
        ];
        if let Some(since) = since {
            query.push(("start", since.timestamp_millis().to_string()));
        }

        let result: KlineResult = self.get("fetch_bars", "/v5/market/kline", &query).await?;
        let bars = result
            .list
            .iter()
            .map(|row| parse_kline_row(row))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            symbol = %symbol,
            interval = %interval,
            count = bars.len(),
            "BybitMarketData: fetched {} bars for {} {}",
            bars.len(),
            symbol,
            interval
        );
        Ok(bars)
    }

    async fn latest_price(&self, symbol: &str) -> Result<Decimal> {
        let query = [
            ("category", self.category.clone()),
            ("symbol", symbol.to_string()),
        ];
        let result: TickerResult = self.get("latest_price", "/v5/market/tickers", &query).await?;
        let ticker = result
            .list
            .into_iter()
            .find(|t| t.symbol == symbol)
            .ok_or_else(|| StalkerError::external("latest_price", format!("no ticker for {}", symbol)))?;

        let raw = ticker
            .mark_price
            .or(ticker.last_price)
            .ok_or_else(|| StalkerError::external("latest_price", format!("ticker for {} has no price", symbol)))?;
        decimal(&raw, "markPrice")
    }
}
