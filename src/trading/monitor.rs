//! Per-tick evaluation of active trades against the live price

use futures_util::future::join_all;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};

use super::book::TradeBook;
use crate::config::{MonitorConfig, TrailingConfig};
use crate::error::{Result, StalkerError};
use crate::models::trade::{ActiveTrade, ExitReason, TradeDirection, TradeState};
use crate::services::market_data::OrderSink;

/// Outcome of checking one trade at one price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeCheck {
    Hold {
        pnl: Decimal,
        pnl_pct: Decimal,
        /// Tightened stop, when trailing applies.
        trailed_stop: Option<Decimal>,
    },
    Close {
        reason: ExitReason,
        pnl: Decimal,
    },
}

#[derive(Debug, Clone, Default)]
pub struct MonitorReport {
    pub evaluated: usize,
    pub closed: Vec<(ActiveTrade, ExitReason, Decimal)>,
    pub trailed: usize,
    /// Order ids whose price could not be fetched this tick.
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TradeMonitor {
    config: MonitorConfig,
}

impl TradeMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    pub fn check(&self, trade: &ActiveTrade, price: Decimal) -> TradeCheck {
        let pnl = trade.unrealized_pnl(price);
        if let Some(reason) = trade.exit_reason(price) {
            return TradeCheck::Close { reason, pnl };
        }
        let pnl_pct = trade.pnl_pct(price);
        let trailed_stop = self
            .config
            .trailing
            .as_ref()
            .and_then(|trailing| trailed_stop(trade, price, pnl_pct, trailing));
        TradeCheck::Hold {
            pnl,
            pnl_pct,
            trailed_stop,
        }
    }

    /// Evaluate every trade in `book`; one failed price fetch never blocks the others.
    pub async fn run(&self, book: &TradeBook, sink: &dyn OrderSink) -> MonitorReport {
        let trades = book.snapshot().await;
        let mut report = MonitorReport::default();
        if trades.is_empty() {
            return report;
        }

        let prices = join_all(trades.iter().map(|trade| self.price(sink, &trade.symbol))).await;

        for (trade, price) in trades.into_iter().zip(prices) {
            let price = match price {
                Ok(price) => price,
                Err(e) => {
                    warn!(
                        order_id = %trade.order_id,
                        symbol = %trade.symbol,
                        error = %e,
                        "TradeMonitor: price unavailable for {}, skipping",
                        trade.order_id
                    );
                    report.failed.push(trade.order_id.clone());
                    continue;
                }
            };
            report.evaluated += 1;

            match self.check(&trade, price) {
                TradeCheck::Close { reason, pnl } => {
                    info!(
                        order_id = %trade.order_id,
                        symbol = %trade.symbol,
                        reason = ?reason,
                        price = %price,
                        pnl = %pnl,
                        "TradeMonitor: closing {} {} at {} ({:?})",
                        trade.side,
                        trade.symbol,
                        price,
                        reason
                    );
                    if let Some(mut closed) = book.remove(&trade.order_id).await {
                        closed.state = TradeState::Closed;
                        report.closed.push((closed, reason, price));
                    }
                }
                TradeCheck::Hold {
                    pnl,
                    pnl_pct,
                    trailed_stop,
                } => {
                    info!(
                        order_id = %trade.order_id,
                        symbol = %trade.symbol,
                        price = %price,
                        pnl = %pnl.round_dp(4),
                        pnl_pct = %pnl_pct.round_dp(2),
                        "TradeMonitor: {} {} P&L {} ({}%)",
                        trade.side,
                        trade.symbol,
                        pnl.round_dp(4),
                        pnl_pct.round_dp(2)
                    );
                    if trade.state == TradeState::Open {
                        book.set_state(&trade.order_id, TradeState::Monitoring).await;
                    }
                    if let Some(stop) = trailed_stop {
                        book.set_stop_loss(&trade.order_id, stop).await;
                        report.trailed += 1;
                    }
                }
            }
        }
        report
    }

    async fn price(&self, sink: &dyn OrderSink, symbol: &str) -> Result<Decimal> {
        let limit = Duration::from_millis(self.config.price_timeout_ms);
        match tokio::time::timeout(limit, sink.current_price(symbol)).await {
            Ok(result) => result,
            Err(_) => Err(StalkerError::Timeout {
                operation: format!("current_price {}", symbol),
                after_ms: self.config.price_timeout_ms,
            }),
        }
    }
}

/// Stop moved toward the price once `pnl_pct` passes the activation threshold; never loosened.
fn trailed_stop(
    trade: &ActiveTrade,
    price: Decimal,
    pnl_pct: Decimal,
    trailing: &TrailingConfig,
) -> Option<Decimal> {
    if pnl_pct <= trailing.activation_pct {
        return None;
    }
    match trade.side {
        TradeDirection::Buy => {
            let stop = price * (Decimal::ONE - trailing.trail_fraction);
            (stop > trade.stop_loss).then_some(stop)
        }
        TradeDirection::Sell => {
            let stop = price * (Decimal::ONE + trailing.trail_fraction);
            (stop < trade.stop_loss).then_some(stop)
        }
    }
}
