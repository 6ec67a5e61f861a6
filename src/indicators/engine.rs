//! Indicator engine: SMA, RSI and CCI readings, divergence and signal classification

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use super::divergence::{detect_divergence, DivergenceKind};
use super::momentum::{calculate_cci, calculate_rsi, cci_series, rsi_series};
use super::trend::{calculate_sma, MovingAverage};
use crate::cache::bar_store::BarStore;
use crate::config::IndicatorConfig;
use crate::error::{Result, StalkerError};
use crate::models::bar::{Bar, Series, SeriesKey};
use crate::models::indicators::{Divergence, IndicatorSnapshot, SmaIndicator};
use crate::models::signal::{Signal, SignalDirection};

/// Rolling state kept warm by the feed's push path.
#[derive(Debug, Clone)]
struct WarmAverage {
    average: MovingAverage,
    last_timestamp: DateTime<Utc>,
}

pub struct IndicatorEngine {
    config: IndicatorConfig,
    warm: Mutex<HashMap<SeriesKey, WarmAverage>>,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self {
            config,
            warm: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Feed one newly appended bar into the warm moving average.
    pub fn observe(&self, key: &SeriesKey, bar: &Bar) {
        let mut warm = self.warm.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = warm.entry(key.clone()).or_insert_with(|| WarmAverage {
            average: MovingAverage::new(self.config.sma_period as usize),
            last_timestamp: bar.timestamp,
        });
        if entry.average.len() > 0 && bar.timestamp <= entry.last_timestamp {
            return;
        }
        entry.average.update(bar.close);
        entry.last_timestamp = bar.timestamp;
    }

    /// Warm SMA if it was computed up to exactly `timestamp`.
    fn warm_sma(&self, key: &SeriesKey, timestamp: DateTime<Utc>) -> Option<Decimal> {
        let warm = self.warm.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        warm.get(key)
            .filter(|w| w.last_timestamp == timestamp)
            .and_then(|w| w.average.current())
    }

    /// Snapshot the stored series for `key` and evaluate it.
    pub async fn evaluate_stored(
        &self,
        store: &BarStore,
        key: &SeriesKey,
    ) -> Result<(Signal, IndicatorSnapshot)> {
        let series = store.snapshot(key).await?;
        self.evaluate(&series)
    }

    /// Pure function of `series`: the same series always yields the same signal.
    pub fn evaluate(&self, series: &Series) -> Result<(Signal, IndicatorSnapshot)> {
        let snapshot = self.snapshot(series)?;
        let direction = self.classify(&snapshot);

        debug!(
            symbol = %snapshot.symbol,
            interval = %snapshot.interval,
            price = %snapshot.price,
            sma = %snapshot.sma.value,
            rsi = %snapshot.rsi.value.round_dp(2),
            cci = %snapshot.cci.value.round_dp(2),
            direction = ?direction,
            "IndicatorEngine: {} {} -> {:?}",
            snapshot.symbol,
            snapshot.interval,
            direction
        );

        let signal = Signal::new(
            snapshot.symbol.clone(),
            snapshot.interval,
            direction,
            snapshot.price,
            snapshot.timestamp,
        );
        Ok((signal, snapshot))
    }

    pub fn snapshot(&self, series: &Series) -> Result<IndicatorSnapshot> {
        let cfg = &self.config;
        let required = cfg.required_bars();
        let insufficient = || StalkerError::InsufficientData {
            required,
            available: series.len(),
        };
        if series.len() < required {
            return Err(insufficient());
        }
        let newest = *series.newest().ok_or_else(insufficient)?;

        let closes = series.closes();
        let rsi_period = cfg.rsi_period as usize;
        let cci_period = cfg.cci_period as usize;

        let sma = match self.warm_sma(series.key(), newest.timestamp) {
            Some(value) => SmaIndicator {
                value,
                period: cfg.sma_period,
            },
            None => calculate_sma(&closes, cfg.sma_period).ok_or_else(insufficient)?,
        };
        let rsi = calculate_rsi(&closes, cfg.rsi_period).ok_or_else(insufficient)?;
        let cci = calculate_cci(series.bars(), cfg.cci_period).ok_or_else(insufficient)?;

        let lookback = cfg.divergence_lookback;
        let price_window = tail(&closes, lookback);
        let rsi_window = rsi_series(tail(&closes, lookback + rsi_period), rsi_period);
        let cci_window = cci_series(series.tail(lookback + cci_period.saturating_sub(1)), cci_period);

        let divergence = |oscillator: &[Decimal]| Divergence {
            bullish: detect_divergence(
                price_window,
                oscillator,
                DivergenceKind::Bullish,
                lookback,
                cfg.divergence_min_points,
            ),
            bearish: detect_divergence(
                price_window,
                oscillator,
                DivergenceKind::Bearish,
                lookback,
                cfg.divergence_min_points,
            ),
        };

        Ok(IndicatorSnapshot {
            symbol: series.symbol().to_string(),
            interval: series.interval(),
            timestamp: newest.timestamp,
            price: newest.close,
            sma,
            rsi,
            cci,
            rsi_divergence: divergence(&rsi_window),
            cci_divergence: divergence(&cci_window),
        })
    }

    /// Both oscillators in the oversold zone => buy, both overbought => sell.
    pub fn classify(&self, snapshot: &IndicatorSnapshot) -> SignalDirection {
        let cfg = &self.config;
        let rsi = snapshot.rsi.value;
        let cci = snapshot.cci.value;

        let oversold = rsi < cfg.rsi_oversold && cci < cfg.cci_oversold + cfg.cci_band_margin;
        let overbought = rsi > cfg.rsi_overbought && cci > cfg.cci_overbought - cfg.cci_band_margin;

        if oversold {
            let flags = [snapshot.rsi_divergence.bullish, snapshot.cci_divergence.bullish];
            if cfg.bullish_confirmation.confirms(&flags) {
                SignalDirection::StrongBuy
            } else {
                SignalDirection::Buy
            }
        } else if overbought {
            let flags = [snapshot.rsi_divergence.bearish, snapshot.cci_divergence.bearish];
            if cfg.bearish_confirmation.confirms(&flags) {
                SignalDirection::StrongSell
            } else {
                SignalDirection::Sell
            }
        } else {
            SignalDirection::Hold
        }
    }
}

fn tail<T>(values: &[T], count: usize) -> &[T] {
    &values[values.len().saturating_sub(count)..]
}

impl crate::services::feed::BarObserver for IndicatorEngine {
    fn on_bar(&self, key: &SeriesKey, bar: &Bar) {
        self.observe(key, bar);
    }
}
