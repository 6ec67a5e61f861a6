//! Volume confirmation for pattern-sourced proposals

use rust_decimal::Decimal;

use crate::config::VolumePolicy;

impl VolumePolicy {
    /// Whether `volume` is high enough against the recent `history`.
    ///
    /// An empty history never confirms.
    pub fn confirms(&self, volume: Decimal, history: &[Decimal]) -> bool {
        if history.is_empty() {
            return false;
        }
        match *self {
            VolumePolicy::AboveAverage { multiplier } => volume > average(history) * multiplier,
            VolumePolicy::AboveAverageAndMedian { multiplier } => {
                volume > average(history) * multiplier && volume > median(history)
            }
            VolumePolicy::FractionOfPeak { fraction } => {
                let peak = history.iter().copied().max().unwrap_or(Decimal::ZERO);
                volume > peak * fraction
            }
        }
    }
}

pub fn average(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

pub fn median(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / Decimal::TWO
    } else {
        sorted[mid]
    }
}
