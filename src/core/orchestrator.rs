//! One decision tick: feed, evaluate, fuse, size, place, monitor
//!
//! Symbols are analysed concurrently and independently; a failure or panic
//! while analysing one symbol only drops that symbol for the tick.

use futures_util::future::join_all;
use futures_util::FutureExt;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::bar_store::BarStore;
use crate::db::journal::SignalJournal;
use crate::error::{Result, StalkerError};
use crate::indicators::engine::IndicatorEngine;
use crate::models::bar::SeriesKey;
use crate::models::interval::Interval;
use crate::models::signal::{PatternResult, SignalDirection};
use crate::models::trade::{ActiveTrade, OriginKind, SizedTrade, TradeProposal};
use crate::patterns::pin_bar::PinBarDetector;
use crate::risk::sizer::RiskSizer;
use crate::services::feed::DataFeed;
use crate::services::market_data::OrderSink;
use crate::signals::fusion::SignalFuser;
use crate::trading::book::TradeBook;
use crate::trading::monitor::{MonitorReport, TradeMonitor};

/// Summary of one tick, mostly for logging and tests.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub analyzed: usize,
    pub failed_symbols: Vec<String>,
    pub proposals: usize,
    pub sized: Vec<SizedTrade>,
    pub placed: Vec<String>,
    pub balance: Option<Decimal>,
    pub monitor: MonitorReport,
}

/// Decision stages for a single symbol.
pub struct SymbolPipeline {
    pub store: Arc<BarStore>,
    pub feed: Arc<DataFeed>,
    pub engine: Arc<IndicatorEngine>,
    pub patterns: PinBarDetector,
    pub fuser: SignalFuser,
    /// Intervals evaluated per symbol; the first also feeds pattern detection.
    pub intervals: Vec<Interval>,
}

impl SymbolPipeline {
    pub async fn analyze(&self, symbol: &str) -> Result<Vec<TradeProposal>> {
        let refresh = self.feed.refresh_symbol(symbol).await;
        if !refresh.failed.is_empty() {
            debug!(
                symbol = %symbol,
                failed = refresh.failed.len(),
                "Orchestrator: refresh failed for some {} series, using stored bars",
                symbol
            );
        }

        let mut signals = Vec::with_capacity(self.intervals.len());
        for interval in &self.intervals {
            let key = SeriesKey::new(symbol, *interval);
            match self.engine.evaluate_stored(&self.store, &key).await {
                Ok((signal, _)) if signal.direction == SignalDirection::Hold => {}
                Ok((signal, _)) => signals.push(signal),
                Err(e) if e.is_data_shortage() => {
                    debug!(series = %key, reason = %e, "Orchestrator: holding {}", key);
                }
                Err(e) => return Err(e),
            }
        }

        let pattern_series = match self.intervals.first() {
            Some(interval) => self.store.snapshot(&SeriesKey::new(symbol, *interval)).await.ok(),
            None => None,
        };
        let pattern = pattern_series.as_ref().and_then(|series| {
            match self.patterns.evaluate(series) {
                PatternResult::None => None,
                result => Some((series, result)),
            }
        });

        Ok(self.fuser.fuse(&signals, pattern))
    }
}

pub struct Orchestrator {
    pipeline: SymbolPipeline,
    sizer: RiskSizer,
    monitor: TradeMonitor,
    sink: Arc<dyn OrderSink>,
    book: Arc<TradeBook>,
    journal: Option<Arc<SignalJournal>>,
    symbols: Vec<String>,
    order_timeout: Duration,
    last_balance: Mutex<Option<Decimal>>,
}

impl Orchestrator {
    pub fn new(
        pipeline: SymbolPipeline,
        sizer: RiskSizer,
        monitor: TradeMonitor,
        sink: Arc<dyn OrderSink>,
        symbols: Vec<String>,
        order_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            sizer,
            monitor,
            sink,
            book: Arc::new(TradeBook::new()),
            journal: None,
            symbols,
            order_timeout,
            last_balance: Mutex::new(None),
        }
    }

    pub fn with_journal(mut self, journal: Arc<SignalJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_book(mut self, book: Arc<TradeBook>) -> Self {
        self.book = book;
        self
    }

    pub fn book(&self) -> Arc<TradeBook> {
        self.book.clone()
    }

    pub fn pipeline(&self) -> &SymbolPipeline {
        &self.pipeline
    }

    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        let proposals = self.analyze_all(&mut report).await;
        report.proposals = proposals.len();
        if let Some(journal) = &self.journal {
            for proposal in &proposals {
                journal.record_proposal(proposal).await;
            }
        }

        let balance = self.current_balance().await;
        report.balance = balance;
        match balance {
            Some(balance) if !proposals.is_empty() => {
                report.sized = self.sizer.size(&proposals, balance);
                if let Some(journal) = &self.journal {
                    for trade in &report.sized {
                        journal.record_sized(trade).await;
                    }
                }
                report.placed = self.place_accepted(&report.sized).await;
            }
            Some(_) => {}
            None if !proposals.is_empty() => {
                warn!(
                    proposals = proposals.len(),
                    "Orchestrator: no balance known, skipping sizing for {} proposals",
                    proposals.len()
                );
            }
            None => {}
        }

        report.monitor = self.monitor.run(&self.book, self.sink.as_ref()).await;
        if let Some(journal) = &self.journal {
            for (trade, reason, price) in &report.monitor.closed {
                journal.record_close(trade, *reason, *price).await;
            }
        }

        info!(
            analyzed = report.analyzed,
            failed = report.failed_symbols.len(),
            proposals = report.proposals,
            placed = report.placed.len(),
            closed = report.monitor.closed.len(),
            "Orchestrator: tick finished, {} proposals, {} placed, {} closed",
            report.proposals,
            report.placed.len(),
            report.monitor.closed.len()
        );
        report
    }

    async fn analyze_all(&self, report: &mut TickReport) -> Vec<TradeProposal> {
        let runs = self.symbols.iter().map(|symbol| {
            AssertUnwindSafe(self.pipeline.analyze(symbol)).catch_unwind()
        });
        let results = join_all(runs).await;

        let mut proposals = Vec::new();
        for (symbol, result) in self.symbols.iter().zip(results) {
            match result {
                Ok(Ok(mut found)) => {
                    report.analyzed += 1;
                    proposals.append(&mut found);
                }
                Ok(Err(e)) => {
                    warn!(symbol = %symbol, error = %e, "Orchestrator: skipping {} this tick", symbol);
                    report.failed_symbols.push(symbol.clone());
                }
                Err(_) => {
                    error!(symbol = %symbol, "Orchestrator: analysis of {} panicked, skipping", symbol);
                    report.failed_symbols.push(symbol.clone());
                }
            }
        }
        proposals
    }

    /// Fetch the balance once; fall back to the last known value.
    async fn current_balance(&self) -> Option<Decimal> {
        let fetched = match tokio::time::timeout(self.order_timeout, self.sink.balance()).await {
            Ok(result) => result,
            Err(_) => Err(StalkerError::Timeout {
                operation: "balance".to_string(),
                after_ms: self.order_timeout.as_millis() as u64,
            }),
        };

        let mut last = self.last_balance.lock().await;
        match fetched {
            Ok(balance) => {
                *last = Some(balance);
                Some(balance)
            }
            Err(e) => {
                let fallback = *last;
                warn!(error = %e, fallback = ?fallback, "Orchestrator: balance fetch failed");
                fallback
            }
        }
    }

    /// At most one order per (symbol, origin): pairs with an open trade, and
    /// repeats within this batch (one per interval), are skipped.
    async fn place_accepted(&self, sized: &[SizedTrade]) -> Vec<String> {
        let mut taken: HashSet<(String, OriginKind)> = self
            .book
            .snapshot()
            .await
            .into_iter()
            .map(|active| (active.symbol, active.origin))
            .collect();
        let accepted: Vec<&SizedTrade> = sized
            .iter()
            .filter(|trade| trade.is_acceptable())
            .filter(|trade| {
                let pair = (trade.proposal.symbol.clone(), trade.proposal.origin);
                let busy = !taken.insert(pair);
                if busy {
                    debug!(
                        symbol = %trade.proposal.symbol,
                        origin = ?trade.proposal.origin,
                        "Orchestrator: {} already has a {:?} trade, skipping",
                        trade.proposal.symbol,
                        trade.proposal.origin
                    );
                }
                !busy
            })
            .collect();

        let results = join_all(accepted.iter().map(|trade| self.place(trade))).await;

        let mut placed = Vec::new();
        for (trade, result) in accepted.into_iter().zip(results) {
            match result {
                Ok(order_id) => {
                    let active = ActiveTrade::from_sized(order_id.clone(), trade);
                    if let Some(journal) = &self.journal {
                        journal.record_submission(&active).await;
                    }
                    self.book.insert(active).await;
                    placed.push(order_id);
                }
                Err(e) => {
                    warn!(
                        symbol = %trade.proposal.symbol,
                        error = %e,
                        "Orchestrator: order for {} not placed",
                        trade.proposal.symbol
                    );
                }
            }
        }
        placed
    }

    async fn place(&self, trade: &SizedTrade) -> Result<String> {
        let order = trade.order_request();
        match tokio::time::timeout(self.order_timeout, self.sink.place_order(&order)).await {
            Ok(result) => result,
            Err(_) => Err(StalkerError::Timeout {
                operation: format!("place_order {}", order.symbol),
                after_ms: self.order_timeout.as_millis() as u64,
            }),
        }
    }
}
