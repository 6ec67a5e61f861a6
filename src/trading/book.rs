//! Set of submitted trades awaiting an exit
//!
//! Readers take a copy and work on it without holding the lock, so an order
//! completion can insert a trade while the monitor is evaluating.

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::models::trade::{ActiveTrade, TradeState};

#[derive(Debug, Default)]
pub struct TradeBook {
    trades: Mutex<Vec<ActiveTrade>>,
}

impl TradeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, trade: ActiveTrade) {
        self.trades.lock().await.push(trade);
    }

    /// Owned copy of the current trades.
    pub async fn snapshot(&self) -> Vec<ActiveTrade> {
        self.trades.lock().await.clone()
    }

    pub async fn remove(&self, order_id: &str) -> Option<ActiveTrade> {
        let mut trades = self.trades.lock().await;
        let index = trades.iter().position(|t| t.order_id == order_id)?;
        Some(trades.remove(index))
    }

    pub async fn set_state(&self, order_id: &str, state: TradeState) {
        if let Some(trade) = self.trades.lock().await.iter_mut().find(|t| t.order_id == order_id) {
            trade.state = state;
        }
    }

    pub async fn set_stop_loss(&self, order_id: &str, stop_loss: Decimal) {
        if let Some(trade) = self.trades.lock().await.iter_mut().find(|t| t.order_id == order_id) {
            trade.stop_loss = stop_loss;
        }
    }

    pub async fn len(&self) -> usize {
        self.trades.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.trades.lock().await.is_empty()
    }
}
