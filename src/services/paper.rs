//! Paper trading sink: accepts every order locally, prices come from a market data source

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::Result;
use crate::models::trade::OrderRequest;
use crate::services::market_data::{MarketDataSource, OrderSink};

pub struct PaperOrderSink {
    prices: Arc<dyn MarketDataSource>,
    balance: Decimal,
    next_id: AtomicU64,
    orders: Mutex<Vec<(String, OrderRequest)>>,
}

impl PaperOrderSink {
    pub fn new(prices: Arc<dyn MarketDataSource>, balance: Decimal) -> Self {
        Self {
            prices,
            balance,
            next_id: AtomicU64::new(1),
            orders: Mutex::new(Vec::new()),
        }
    }

    /// Orders accepted so far, with their ids, in submission order.
    pub async fn orders(&self) -> Vec<(String, OrderRequest)> {
        self.orders.lock().await.clone()
    }
}

#[async_trait]
impl OrderSink for PaperOrderSink {
    async fn place_order(&self, order: &OrderRequest) -> Result<String> {
        let id = format!("paper-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        info!(
            order_id = %id,
            symbol = %order.symbol,
            side = %order.side,
            quantity = %order.quantity,
            price = %order.price,
            "PaperOrderSink: accepted {} {} {} @ {}",
            order.side,
            order.quantity,
            order.symbol,
            order.price
        );
        self.orders.lock().await.push((id.clone(), order.clone()));
        Ok(id)
    }

    async fn current_price(&self, symbol: &str) -> Result<Decimal> {
        self.prices.latest_price(symbol).await
    }

    async fn balance(&self) -> Result<Decimal> {
        Ok(self.balance)
    }
}
