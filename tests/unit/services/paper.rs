//! Unit tests for the paper order sink

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stalker::models::bar::Bar;
use stalker::models::interval::Interval;
use stalker::models::trade::{OrderRequest, TradeDirection};
use stalker::services::market_data::{MarketDataSource, OrderSink};
use stalker::services::paper::PaperOrderSink;
use stalker::{Result, StalkerError};
use std::sync::Arc;

struct FixedPrice;

#[async_trait]
impl MarketDataSource for FixedPrice {
    async fn fetch_bars(
        &self,
        _symbol: &str,
        _interval: Interval,
        _since: Option<DateTime<Utc>>,
        _limit: usize,
    ) -> Result<Vec<Bar>> {
        Ok(Vec::new())
    }

    async fn latest_price(&self, symbol: &str) -> Result<Decimal> {
        match symbol {
            "DOTUSDT" => Ok(dec!(5.25)),
            _ => Err(StalkerError::external("latest_price", "unknown symbol")),
        }
    }
}

fn order(symbol: &str) -> OrderRequest {
    OrderRequest {
        symbol: symbol.to_string(),
        side: TradeDirection::Buy,
        quantity: dec!(3),
        price: dec!(5),
        stop_loss: dec!(4.975),
        take_profit: dec!(5.075),
    }
}

#[tokio::test]
async fn test_orders_get_sequential_ids() {
    let sink = PaperOrderSink::new(Arc::new(FixedPrice), dec!(100));

    assert_eq!(sink.place_order(&order("DOTUSDT")).await.unwrap(), "paper-1");
    assert_eq!(sink.place_order(&order("ADAUSDT")).await.unwrap(), "paper-2");

    let orders = sink.orders().await;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[1].0, "paper-2");
    assert_eq!(orders[1].1.symbol, "ADAUSDT");
}

#[tokio::test]
async fn test_balance_and_prices() {
    let sink = PaperOrderSink::new(Arc::new(FixedPrice), dec!(100));
    assert_eq!(tokio_test::assert_ok!(sink.balance().await), dec!(100));
    assert_eq!(tokio_test::assert_ok!(sink.current_price("DOTUSDT").await), dec!(5.25));
    tokio_test::assert_err!(sink.current_price("XUSDT").await);
}
