//! Persistence: append-only audit journal

pub mod journal;

pub use journal::{JournalEntry, SignalJournal};
