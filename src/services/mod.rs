//! Market data ingestion and exchange adapters.

pub mod bybit;
pub mod feed;
pub mod market_data;
pub mod paper;

pub use bybit::BybitMarketData;
pub use feed::{BarObserver, DataFeed, FeedReport};
pub use market_data::{MarketDataSource, OrderSink};
pub use paper::PaperOrderSink;
