//! Unit tests for the audit journal

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;
use stalker::db::journal::{JournalEntry, SignalJournal};
use stalker::models::interval::Interval;
use stalker::models::trade::{
    ActiveTrade, Conviction, ExitReason, OriginKind, RiskClass, SizedTrade, TradeDirection,
    TradeProposal,
};

fn sized() -> SizedTrade {
    SizedTrade {
        proposal: TradeProposal {
            symbol: "DOTUSDT".to_string(),
            interval: Interval::FiveMinutes,
            direction: TradeDirection::Buy,
            conviction: Conviction::Strong,
            entry_price: dec!(5),
            stop_loss: dec!(4.975),
            take_profit: dec!(5.075),
            origin: OriginKind::Indicator,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp"),
        },
        amount: dec!(6),
        risk_class: RiskClass::Acceptable,
    }
}

#[tokio::test]
async fn test_entries_land_in_per_symbol_files() {
    let dir = tempfile::tempdir().unwrap();
    let journal = SignalJournal::new(dir.path().join("journal"));

    let proposal = sized();
    let trade = ActiveTrade::from_sized("paper-1", &proposal);
    journal.record_proposal(&proposal.proposal).await;
    journal.record_sized(&proposal).await;
    journal.record_submission(&trade).await;
    journal.record_close(&trade, ExitReason::TakeProfit, dec!(5.1)).await;

    assert!(journal.path_for("DOTUSDT", "signals").ends_with("DOTUSDT_signals.jsonl"));

    let signals = journal.read("DOTUSDT", "signals").await.unwrap();
    assert_eq!(signals.len(), 2);
    match &signals[0] {
        JournalEntry::Proposal { proposal: fused, .. } => assert_eq!(fused, &proposal.proposal),
        other => panic!("unexpected entry {:?}", other),
    }
    match &signals[1] {
        JournalEntry::Sized { trade, .. } => assert_eq!(trade, &proposal),
        other => panic!("unexpected entry {:?}", other),
    }

    let trades = journal.read("DOTUSDT", "trades").await.unwrap();
    assert_eq!(trades.len(), 2);
    assert!(matches!(trades[0], JournalEntry::Submitted { .. }));
    match &trades[1] {
        JournalEntry::Closed { reason, exit_price, pnl, .. } => {
            assert_eq!(*reason, ExitReason::TakeProfit);
            assert_eq!(*exit_price, dec!(5.1));
            // (5.1 - 5) * 6
            assert_eq!(*pnl, dec!(0.6));
        }
        other => panic!("unexpected entry {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let journal = SignalJournal::new(dir.path());
    assert!(journal.read("ADAUSDT", "trades").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_write_failures_are_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let journal = SignalJournal::new(&blocker);
    assert!(journal.append(&JournalEntry::Sized {
        recorded_at: Utc::now(),
        trade: sized(),
    })
    .await
    .is_err());

    // Best-effort path only logs.
    journal.record_sized(&sized()).await;
}
