//! Bybit v5 response envelopes

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use crate::error::{Result, StalkerError};
use crate::models::bar::Bar;

#[derive(Debug, Deserialize)]
pub struct BybitResponse<T> {
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    #[serde(rename = "retMsg", default)]
    pub ret_msg: String,
    pub result: Option<T>,
}

impl<T> BybitResponse<T> {
    pub fn into_result(self, operation: &str) -> Result<T> {
        if self.ret_code != 0 {
            return Err(StalkerError::external(
                operation,
                format!("retCode {}: {}", self.ret_code, self.ret_msg),
            ));
        }
        self.result
            .ok_or_else(|| StalkerError::external(operation, "response without result"))
    }
}

/// `list` rows are `[start, open, high, low, close, volume, turnover]`, newest first.
#[derive(Debug, Deserialize)]
pub struct KlineResult {
    #[serde(default)]
    pub list: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct TickerResult {
    #[serde(default)]
    pub list: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    #[serde(rename = "markPrice", default)]
    pub mark_price: Option<String>,
    #[serde(rename = "lastPrice", default)]
    pub last_price: Option<String>,
}

pub fn parse_kline_row(row: &[String]) -> Result<Bar> {
    if row.len() < 7 {
        return Err(StalkerError::external(
            "parse kline",
            format!("expected 7 fields, got {}", row.len()),
        ));
    }
    let start_ms: i64 = row[0]
        .parse()
        .map_err(|e| StalkerError::external("parse kline", format!("bad start time '{}': {}", row[0], e)))?;
    let timestamp = DateTime::from_timestamp_millis(start_ms)
        .ok_or_else(|| StalkerError::external("parse kline", format!("start time out of range: {}", start_ms)))?;

    Ok(Bar {
        timestamp,
        open: decimal(&row[1], "open")?,
        high: decimal(&row[2], "high")?,
        low: decimal(&row[3], "low")?,
        close: decimal(&row[4], "close")?,
        volume: decimal(&row[5], "volume")?,
        turnover: decimal(&row[6], "turnover")?,
    })
}

pub(crate) fn decimal(raw: &str, field: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|e| StalkerError::external("parse decimal", format!("invalid {} '{}': {}", field, raw, e)))
}
