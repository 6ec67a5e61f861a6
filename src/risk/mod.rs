//! Position sizing and risk screening

pub mod sizer;

pub use sizer::RiskSizer;
