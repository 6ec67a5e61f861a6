//! Price/oscillator divergence
//!
//! Bullish: the latest close is at or below every earlier close in the window
//! while the oscillator stays above its earlier minimum. Bearish mirrors it.
//! Either way at least `min_points` bar-to-bar steps in the window must move
//! price and oscillator in opposite directions.

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceKind {
    Bullish,
    Bearish,
}

/// `prices` and `oscillator` are aligned at their last element.
///
/// Fewer than `lookback` points in either slice never reports a divergence.
pub fn detect_divergence(
    prices: &[Decimal],
    oscillator: &[Decimal],
    kind: DivergenceKind,
    lookback: usize,
    min_points: usize,
) -> bool {
    if lookback < 2 || prices.len() < lookback || oscillator.len() < lookback {
        return false;
    }

    let prices = &prices[prices.len() - lookback..];
    let oscillator = &oscillator[oscillator.len() - lookback..];
    let (prior_prices, latest_price) = prices.split_at(lookback - 1);
    let (prior_osc, latest_osc) = oscillator.split_at(lookback - 1);
    let (latest_price, latest_osc) = (latest_price[0], latest_osc[0]);

    let new_extreme = match kind {
        DivergenceKind::Bullish => {
            prior_prices.iter().all(|p| latest_price <= *p)
                && prior_osc.iter().any(|o| latest_osc > *o)
        }
        DivergenceKind::Bearish => {
            prior_prices.iter().all(|p| latest_price >= *p)
                && prior_osc.iter().any(|o| latest_osc < *o)
        }
    };
    if !new_extreme {
        return false;
    }

    let opposing_steps = prices
        .windows(2)
        .zip(oscillator.windows(2))
        .filter(|(p, o)| {
            let price_move = p[1] - p[0];
            let osc_move = o[1] - o[0];
            (price_move > Decimal::ZERO && osc_move < Decimal::ZERO)
                || (price_move < Decimal::ZERO && osc_move > Decimal::ZERO)
        })
        .count();

    opposing_steps >= min_points
}
