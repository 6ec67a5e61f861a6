//! Candlestick pattern detection

pub mod pin_bar;

pub use pin_bar::PinBarDetector;
