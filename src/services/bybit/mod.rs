//! Bybit public market data over REST

mod client;
mod response;

pub use client::BybitMarketData;
pub use response::{parse_kline_row, BybitResponse, KlineResult, Ticker, TickerResult};
