//! Momentum oscillators: RSI (bounded), CCI (unbounded)

pub mod cci;
pub mod rsi;

pub use cci::*;
pub use rsi::*;
