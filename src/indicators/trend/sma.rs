//! SMA (Simple Moving Average) indicator

use rust_decimal::Decimal;
use std::collections::VecDeque;

use crate::models::indicators::SmaIndicator;

/// SMA of the last `period` values.
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: Decimal = values[values.len() - period..].iter().sum();
    Some(sum / Decimal::from(period))
}

pub fn calculate_sma(closes: &[Decimal], period: u32) -> Option<SmaIndicator> {
    Some(SmaIndicator {
        value: sma(closes, period as usize)?,
        period,
    })
}

/// Rolling SMA kept warm as bars arrive.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    period: usize,
    values: VecDeque<Decimal>,
    sum: Decimal,
}

impl MovingAverage {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            values: VecDeque::with_capacity(period.max(1)),
            sum: Decimal::ZERO,
        }
    }

    /// Add a value and return the average once the window is full.
    pub fn update(&mut self, value: Decimal) -> Option<Decimal> {
        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        self.current()
    }

    pub fn current(&self) -> Option<Decimal> {
        if self.is_ready() {
            Some(self.sum / Decimal::from(self.period))
        } else {
            None
        }
    }

    pub fn is_ready(&self) -> bool {
        self.values.len() == self.period
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
