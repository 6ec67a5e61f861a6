//! Append-only per-symbol JSON-lines audit files
//!
//! `<dir>/<SYMBOL>_signals.jsonl` records every fused proposal and its sizing,
//! `<dir>/<SYMBOL>_trades.jsonl` every submission and close. Writes are
//! best-effort: callers log failures and carry on.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::Result;
use crate::models::trade::{ActiveTrade, ExitReason, SizedTrade, TradeProposal};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEntry {
    Proposal {
        recorded_at: DateTime<Utc>,
        proposal: TradeProposal,
    },
    Sized {
        recorded_at: DateTime<Utc>,
        trade: SizedTrade,
    },
    Submitted {
        recorded_at: DateTime<Utc>,
        trade: ActiveTrade,
    },
    Closed {
        recorded_at: DateTime<Utc>,
        trade: ActiveTrade,
        reason: ExitReason,
        exit_price: Decimal,
        pnl: Decimal,
    },
}

impl JournalEntry {
    fn symbol(&self) -> &str {
        match self {
            Self::Proposal { proposal, .. } => &proposal.symbol,
            Self::Sized { trade, .. } => &trade.proposal.symbol,
            Self::Submitted { trade, .. } | Self::Closed { trade, .. } => &trade.symbol,
        }
    }

    fn file_suffix(&self) -> &'static str {
        match self {
            Self::Proposal { .. } | Self::Sized { .. } => "signals",
            Self::Submitted { .. } | Self::Closed { .. } => "trades",
        }
    }
}

pub struct SignalJournal {
    dir: PathBuf,
    // serializes appends so lines never interleave
    write_lock: Mutex<()>,
}

impl SignalJournal {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.jsonl", symbol, suffix))
    }

    pub async fn append(&self, entry: &JournalEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(entry.symbol(), entry.file_suffix()))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Append, logging instead of failing.
    pub async fn record(&self, entry: JournalEntry) {
        if let Err(e) = self.append(&entry).await {
            warn!(
                symbol = %entry.symbol(),
                error = %e,
                "SignalJournal: failed to write {} entry",
                entry.file_suffix()
            );
        }
    }

    pub async fn record_proposal(&self, proposal: &TradeProposal) {
        self.record(JournalEntry::Proposal {
            recorded_at: Utc::now(),
            proposal: proposal.clone(),
        })
        .await;
    }

    pub async fn record_sized(&self, trade: &SizedTrade) {
        self.record(JournalEntry::Sized {
            recorded_at: Utc::now(),
            trade: trade.clone(),
        })
        .await;
    }

    pub async fn record_submission(&self, trade: &ActiveTrade) {
        self.record(JournalEntry::Submitted {
            recorded_at: Utc::now(),
            trade: trade.clone(),
        })
        .await;
    }

    pub async fn record_close(&self, trade: &ActiveTrade, reason: ExitReason, exit_price: Decimal) {
        self.record(JournalEntry::Closed {
            recorded_at: Utc::now(),
            trade: trade.clone(),
            reason,
            exit_price,
            pnl: trade.unrealized_pnl(exit_price),
        })
        .await;
    }

    /// Every entry recorded for `symbol` in one file, oldest first.
    pub async fn read(&self, symbol: &str, suffix: &str) -> Result<Vec<JournalEntry>> {
        let path = self.path_for(symbol, suffix);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }
}
