//! RSI (Relative Strength Index) indicator

use rust_decimal::Decimal;

use crate::models::indicators::RsiIndicator;

/// RSI over the last `period` close-to-close changes.
///
/// RSI = 100 - (100 / (1 + RS)), RS = average gain / average loss
pub fn rsi(closes: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let window = &closes[closes.len() - period - 1..];
    let mut gains = Decimal::ZERO;
    let mut losses = Decimal::ZERO;
    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > Decimal::ZERO {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    if losses.is_zero() {
        return Some(Decimal::ONE_HUNDRED);
    }

    // Both averages share the period, so it cancels out of RS.
    let rs = gains / losses;
    Some(Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs))
}

/// RSI for every bar from index `period` onwards.
pub fn rsi_series(closes: &[Decimal], period: usize) -> Vec<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return Vec::new();
    }
    (period + 1..=closes.len())
        .filter_map(|end| rsi(&closes[..end], period))
        .collect()
}

pub fn calculate_rsi(closes: &[Decimal], period: u32) -> Option<RsiIndicator> {
    Some(RsiIndicator {
        value: rsi(closes, period as usize)?,
        period,
    })
}
