//! Pin bar (hammer / shooting star) detection on the newest bar
//!
//! All checks compare absolute lengths scaled by the configured multiples, so a
//! zero-length body never divides.

use rust_decimal::Decimal;

use crate::config::PatternConfig;
use crate::models::bar::{Bar, Series};
use crate::models::signal::PatternResult;

#[derive(Debug, Clone, Default)]
pub struct PinBarDetector {
    config: PatternConfig,
}

impl PinBarDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }

    /// Classify the most recent bar of `series`; an empty series is `None`.
    pub fn evaluate(&self, series: &Series) -> PatternResult {
        series
            .newest()
            .map(|bar| self.classify(bar))
            .unwrap_or(PatternResult::None)
    }

    pub fn classify(&self, bar: &Bar) -> PatternResult {
        let body = bar.body();
        // A doji has no body to compare shadows against.
        if body.is_zero() {
            return PatternResult::None;
        }

        let long_enough = |shadow: Decimal| shadow >= body * self.config.shadow_to_body;
        let short_enough = |shadow: Decimal| shadow <= body * self.config.opposite_shadow_to_body;

        let upper = bar.upper_shadow();
        let lower = bar.lower_shadow();

        if long_enough(lower) && short_enough(upper) {
            PatternResult::BullishReversal
        } else if long_enough(upper) && short_enough(lower) {
            PatternResult::BearishReversal
        } else {
            PatternResult::None
        }
    }
}
