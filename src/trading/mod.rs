//! Active trade bookkeeping and lifecycle monitoring

pub mod book;
pub mod monitor;

pub use book::TradeBook;
pub use monitor::{MonitorReport, TradeCheck, TradeMonitor};
