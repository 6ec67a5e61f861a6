//! In-memory market data cache

pub mod bar_store;

pub use bar_store::{AppendOutcome, BarStore};
