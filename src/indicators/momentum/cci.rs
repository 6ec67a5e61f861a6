//! CCI (Commodity Channel Index) indicator

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::bar::Bar;
use crate::models::indicators::CciIndicator;

const LAMBERT_CONSTANT: Decimal = dec!(0.015);

/// CCI = (TP - SMA(TP)) / (0.015 * mean deviation), TP = (high + low + close) / 3
pub fn cci(bars: &[Bar], period: usize) -> Option<Decimal> {
    if period == 0 || bars.len() < period {
        return None;
    }

    let typical: Vec<Decimal> = bars[bars.len() - period..]
        .iter()
        .map(Bar::typical_price)
        .collect();
    let count = Decimal::from(period);
    let mean = typical.iter().sum::<Decimal>() / count;
    let mean_deviation = typical.iter().map(|tp| (*tp - mean).abs()).sum::<Decimal>() / count;

    let latest = *typical.last()?;
    if mean_deviation.is_zero() {
        return Some(Decimal::ZERO);
    }
    Some((latest - mean) / (LAMBERT_CONSTANT * mean_deviation))
}

/// CCI for every bar from index `period - 1` onwards.
pub fn cci_series(bars: &[Bar], period: usize) -> Vec<Decimal> {
    if period == 0 || bars.len() < period {
        return Vec::new();
    }
    (period..=bars.len())
        .filter_map(|end| cci(&bars[..end], period))
        .collect()
}

pub fn calculate_cci(bars: &[Bar], period: u32) -> Option<CciIndicator> {
    Some(CciIndicator {
        value: cci(bars, period as usize)?,
        period,
    })
}
