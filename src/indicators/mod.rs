//! Technical indicators over fixed-point closes, plus the engine that turns them into signals

pub mod divergence;
pub mod engine;
pub mod momentum;
pub mod trend;

pub use divergence::{detect_divergence, DivergenceKind};
pub use engine::IndicatorEngine;
pub use momentum::*;
pub use trend::*;
