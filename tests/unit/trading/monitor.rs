//! Unit tests for trade lifecycle monitoring

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stalker::config::{MonitorConfig, TrailingConfig};
use stalker::models::trade::{
    ActiveTrade, ExitReason, OrderRequest, OriginKind, TradeDirection, TradeState,
};
use stalker::services::market_data::OrderSink;
use stalker::trading::book::TradeBook;
use stalker::trading::monitor::{TradeCheck, TradeMonitor};
use stalker::{Result, StalkerError};
use std::collections::HashMap;
use std::time::Duration;

/// Prices per symbol; symbols missing from the map fail, "SLOWUSDT" hangs.
struct PriceSink {
    prices: HashMap<String, Decimal>,
}

impl PriceSink {
    fn new(prices: &[(&str, Decimal)]) -> Self {
        Self {
            prices: prices.iter().map(|(s, p)| (s.to_string(), *p)).collect(),
        }
    }
}

#[async_trait]
impl OrderSink for PriceSink {
    async fn place_order(&self, _order: &OrderRequest) -> Result<String> {
        Ok("unused".to_string())
    }

    async fn current_price(&self, symbol: &str) -> Result<Decimal> {
        if symbol == "SLOWUSDT" {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| StalkerError::external("current_price", format!("{} unavailable", symbol)))
    }

    async fn balance(&self) -> Result<Decimal> {
        Ok(dec!(100))
    }
}

fn trade(id: &str, symbol: &str, side: TradeDirection, entry: Decimal, stop: Decimal, target: Decimal) -> ActiveTrade {
    ActiveTrade {
        order_id: id.to_string(),
        symbol: symbol.to_string(),
        side,
        entry_price: entry,
        stop_loss: stop,
        take_profit: target,
        amount: dec!(2),
        origin: OriginKind::Indicator,
        state: TradeState::Open,
        opened_at: Utc::now(),
    }
}

fn long() -> ActiveTrade {
    trade("a", "AUSDT", TradeDirection::Buy, dec!(100), dec!(95), dec!(110))
}

fn short() -> ActiveTrade {
    trade("b", "BUSDT", TradeDirection::Sell, dec!(100), dec!(105), dec!(90))
}

#[test]
fn test_long_exit_conditions() {
    let trade = long();
    assert_eq!(trade.exit_reason(dec!(110)), Some(ExitReason::TakeProfit));
    assert_eq!(trade.exit_reason(dec!(111)), Some(ExitReason::TakeProfit));
    assert_eq!(trade.exit_reason(dec!(95)), Some(ExitReason::StopLoss));
    assert_eq!(trade.exit_reason(dec!(80)), Some(ExitReason::StopLoss));
    for price in [dec!(95.01), dec!(100), dec!(109.99)] {
        assert_eq!(trade.exit_reason(price), None);
    }
}

#[test]
fn test_short_exit_conditions() {
    let trade = short();
    assert_eq!(trade.exit_reason(dec!(90)), Some(ExitReason::TakeProfit));
    assert_eq!(trade.exit_reason(dec!(105)), Some(ExitReason::StopLoss));
    assert_eq!(trade.exit_reason(dec!(100)), None);
}

#[test]
fn test_pnl_is_direction_aware() {
    assert_eq!(long().unrealized_pnl(dec!(103)), dec!(6));
    assert_eq!(short().unrealized_pnl(dec!(103)), dec!(-6));
    assert_eq!(long().pnl_pct(dec!(103)), dec!(3));
    assert_eq!(short().pnl_pct(dec!(97)), dec!(3));
}

#[test]
fn test_trailing_only_tightens() {
    let monitor = TradeMonitor::new(MonitorConfig {
        trailing: Some(TrailingConfig::default()),
        ..MonitorConfig::default()
    });

    // +1% passes the 0.5% activation; stop moves to 101 * 0.995.
    match monitor.check(&long(), dec!(101)) {
        TradeCheck::Hold { trailed_stop, .. } => assert_eq!(trailed_stop, Some(dec!(100.495))),
        other => panic!("expected hold, got {:?}", other),
    }
    // +0.3% stays put.
    match monitor.check(&long(), dec!(100.3)) {
        TradeCheck::Hold { trailed_stop, .. } => assert_eq!(trailed_stop, None),
        other => panic!("expected hold, got {:?}", other),
    }
    // Short in profit trails above the price.
    match monitor.check(&short(), dec!(98)) {
        TradeCheck::Hold { trailed_stop, .. } => assert_eq!(trailed_stop, Some(dec!(98.49))),
        other => panic!("expected hold, got {:?}", other),
    }
}

#[test]
fn test_no_trailing_without_policy() {
    match TradeMonitor::default().check(&long(), dec!(108)) {
        TradeCheck::Hold { trailed_stop, pnl, .. } => {
            assert_eq!(trailed_stop, None);
            assert_eq!(pnl, dec!(16));
        }
        other => panic!("expected hold, got {:?}", other),
    }
}

#[tokio::test]
async fn test_run_closes_and_removes_exited_trades() {
    let book = TradeBook::new();
    book.insert(long()).await;
    book.insert(short()).await;

    let sink = PriceSink::new(&[("AUSDT", dec!(110)), ("BUSDT", dec!(100))]);
    let report = TradeMonitor::default().run(&book, &sink).await;

    assert_eq!(report.evaluated, 2);
    assert_eq!(report.closed.len(), 1);
    let (closed, reason, price) = &report.closed[0];
    assert_eq!(closed.order_id, "a");
    assert_eq!(closed.state, TradeState::Closed);
    assert_eq!(*reason, ExitReason::TakeProfit);
    assert_eq!(*price, dec!(110));

    let remaining = book.snapshot().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].order_id, "b");
    assert_eq!(remaining[0].state, TradeState::Monitoring);
}

#[tokio::test]
async fn test_price_failure_is_isolated_per_trade() {
    let book = TradeBook::new();
    book.insert(trade("missing", "MISSINGUSDT", TradeDirection::Buy, dec!(100), dec!(95), dec!(110))).await;
    book.insert(long()).await;

    let sink = PriceSink::new(&[("AUSDT", dec!(95))]);
    let report = TradeMonitor::default().run(&book, &sink).await;

    assert_eq!(report.failed, vec!["missing".to_string()]);
    assert_eq!(report.closed.len(), 1);
    assert_eq!(report.closed[0].1, ExitReason::StopLoss);
    assert_eq!(book.len().await, 1);
}

#[tokio::test]
async fn test_slow_price_times_out_without_blocking_others() {
    let book = TradeBook::new();
    book.insert(trade("slow", "SLOWUSDT", TradeDirection::Buy, dec!(100), dec!(95), dec!(110))).await;
    book.insert(long()).await;

    let monitor = TradeMonitor::new(MonitorConfig {
        price_timeout_ms: 50,
        trailing: None,
    });
    let sink = PriceSink::new(&[("SLOWUSDT", dec!(200)), ("AUSDT", dec!(120))]);
    let report = monitor.run(&book, &sink).await;

    assert_eq!(report.failed, vec!["slow".to_string()]);
    assert_eq!(report.closed.len(), 1);
    assert_eq!(report.closed[0].0.order_id, "a");
}

#[tokio::test]
async fn test_trailed_stop_is_written_back() {
    let book = TradeBook::new();
    book.insert(long()).await;

    let monitor = TradeMonitor::new(MonitorConfig {
        trailing: Some(TrailingConfig::default()),
        ..MonitorConfig::default()
    });
    let sink = PriceSink::new(&[("AUSDT", dec!(105))]);
    let report = monitor.run(&book, &sink).await;

    assert_eq!(report.trailed, 1);
    assert_eq!(book.snapshot().await[0].stop_loss, dec!(104.475));
}

#[tokio::test]
async fn test_insert_during_monitoring_is_kept() {
    let book = TradeBook::new();
    book.insert(long()).await;

    let trades = book.snapshot().await;
    book.insert(short()).await;
    assert_eq!(trades.len(), 1);

    book.remove("a").await;
    let remaining = book.snapshot().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].order_id, "b");
    assert!(book.remove("missing").await.is_none());
}
