//! Runtime configuration and pipeline policy parameters
//!
//! Every numeric policy constant lives here so that thresholds, risk fractions
//! and schedules are configuration rather than code.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::models::interval::Interval;
use crate::models::trade::{Conviction, RiskClass, TradeDirection};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required setting: {0}")]
    Missing(String),
}

/// Deployment environment (`ENVIRONMENT`), defaults to `sandbox`.
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn get_bybit_base_url() -> String {
    env::var("BYBIT_BASE_URL").unwrap_or_else(|_| "https://api.bybit.com".to_string())
}

/// Bar store sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub retention_cap: usize,
    pub backfill_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention_cap: 250,
            backfill_limit: 200,
        }
    }
}

/// Which oscillators must agree before a divergence confirms a strong signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confirmation {
    All,
    Any,
}

impl Confirmation {
    pub fn confirms(self, flags: &[bool]) -> bool {
        match self {
            Self::All => !flags.is_empty() && flags.iter().all(|f| *f),
            Self::Any => flags.iter().any(|f| *f),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub sma_period: u32,
    pub rsi_period: u32,
    pub cci_period: u32,
    pub rsi_oversold: Decimal,
    pub rsi_overbought: Decimal,
    pub cci_oversold: Decimal,
    pub cci_overbought: Decimal,
    /// Pulls the CCI zones inwards: oversold below `cci_oversold + margin`.
    pub cci_band_margin: Decimal,
    pub divergence_lookback: usize,
    pub divergence_min_points: usize,
    pub bullish_confirmation: Confirmation,
    pub bearish_confirmation: Confirmation,
}

impl IndicatorConfig {
    /// Bars needed before every indicator window is filled.
    pub fn required_bars(&self) -> usize {
        (self.sma_period as usize)
            .max(self.rsi_period as usize + 1)
            .max(self.cci_period as usize)
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_period: 100,
            rsi_period: 14,
            cci_period: 7,
            rsi_oversold: dec!(30),
            rsi_overbought: dec!(70),
            cci_oversold: dec!(-200),
            cci_overbought: dec!(200),
            cci_band_margin: dec!(30),
            divergence_lookback: 20,
            divergence_min_points: 3,
            bullish_confirmation: Confirmation::All,
            bearish_confirmation: Confirmation::Any,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Dominant shadow must be at least this multiple of the body.
    pub shadow_to_body: Decimal,
    /// Opposite shadow must be at most this multiple of the body.
    pub opposite_shadow_to_body: Decimal,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            shadow_to_body: dec!(2),
            opposite_shadow_to_body: dec!(0.5),
        }
    }
}

/// Volume confirmation rule for pattern-sourced proposals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VolumePolicy {
    AboveAverage { multiplier: Decimal },
    AboveAverageAndMedian { multiplier: Decimal },
    FractionOfPeak { fraction: Decimal },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    pub volume_policy: VolumePolicy,
    pub volume_lookback: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: dec!(0.005),
            take_profit_pct: dec!(0.015),
            volume_policy: VolumePolicy::AboveAverageAndMedian {
                multiplier: dec!(1.5),
            },
            volume_lookback: 250,
        }
    }
}

/// Risk class assigned to each (direction, conviction) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskClassPolicy {
    pub strong_buy: RiskClass,
    pub buy: RiskClass,
    pub strong_sell: RiskClass,
    pub sell: RiskClass,
}

impl RiskClassPolicy {
    pub fn classify(&self, direction: TradeDirection, conviction: Conviction) -> RiskClass {
        match (direction, conviction) {
            (TradeDirection::Buy, Conviction::Strong) => self.strong_buy,
            (TradeDirection::Buy, Conviction::Regular) => self.buy,
            (TradeDirection::Sell, Conviction::Strong) => self.strong_sell,
            (TradeDirection::Sell, Conviction::Regular) => self.sell,
        }
    }
}

impl Default for RiskClassPolicy {
    fn default() -> Self {
        Self {
            strong_buy: RiskClass::Acceptable,
            buy: RiskClass::Acceptable,
            strong_sell: RiskClass::Acceptable,
            sell: RiskClass::Medium,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    pub min_balance: Decimal,
    pub risk_fraction: Decimal,
    /// Decimal places kept when truncating a quantity.
    pub lot_scale: u32,
    /// Symbols whose lot size only allows whole units.
    pub whole_lot_symbols: HashSet<String>,
    pub class_policy: RiskClassPolicy,
}

impl RiskConfig {
    pub fn lot_scale_for(&self, symbol: &str) -> u32 {
        if self.whole_lot_symbols.contains(symbol) {
            0
        } else {
            self.lot_scale
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_balance: dec!(5),
            risk_fraction: dec!(0.3),
            lot_scale: 1,
            whole_lot_symbols: ["FTMUSDT", "GMTUSDT", "ADAUSDT"]
                .into_iter()
                .map(String::from)
                .collect(),
            class_policy: RiskClassPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailingConfig {
    /// Unrealized P&L percentage that activates trailing.
    pub activation_pct: Decimal,
    /// Distance of the trailed stop from the current price, as a fraction.
    pub trail_fraction: Decimal,
}

impl Default for TrailingConfig {
    fn default() -> Self {
        Self {
            activation_pct: dec!(0.5),
            trail_fraction: dec!(0.005),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub price_timeout_ms: u64,
    pub trailing: Option<TrailingConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            price_timeout_ms: 5_000,
            trailing: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub refresh_interval_seconds: u64,
    pub eviction_interval_seconds: u64,
    pub evaluation_interval_seconds: u64,
    pub fetch_timeout_ms: u64,
    pub order_timeout_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: 60,
            eviction_interval_seconds: 1_800,
            evaluation_interval_seconds: 60,
            fetch_timeout_ms: 10_000,
            order_timeout_ms: 10_000,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub symbols: Vec<String>,
    pub intervals: Vec<Interval>,
    pub paper_balance: Decimal,
    pub journal_dir: PathBuf,
    pub store: StoreConfig,
    pub indicators: IndicatorConfig,
    pub patterns: PatternConfig,
    pub fusion: FusionConfig,
    pub risk: RiskConfig,
    pub monitor: MonitorConfig,
    pub schedule: ScheduleConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: ["AVAXUSDT", "ADAUSDT", "DOGEUSDT", "DOTUSDT", "NEARUSDT", "OPUSDT"]
                .into_iter()
                .map(String::from)
                .collect(),
            intervals: vec![Interval::OneMinute],
            paper_balance: dec!(100),
            journal_dir: PathBuf::from("journal"),
            store: StoreConfig::default(),
            indicators: IndicatorConfig::default(),
            patterns: PatternConfig::default(),
            fusion: FusionConfig::default(),
            risk: RiskConfig::default(),
            monitor: MonitorConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(symbols) = read_list("SYMBOLS") {
            if symbols.is_empty() {
                return Err(ConfigError::Missing("SYMBOLS".to_string()));
            }
            config.symbols = symbols.into_iter().map(|s| s.to_ascii_uppercase()).collect();
        }
        if let Some(intervals) = read_list("INTERVALS") {
            config.intervals = intervals
                .iter()
                .map(|value| Interval::from_str(value))
                .collect::<Result<Vec<_>, _>>()?;
            if config.intervals.is_empty() {
                return Err(ConfigError::Missing("INTERVALS".to_string()));
            }
        }
        if let Ok(dir) = env::var("JOURNAL_DIR") {
            config.journal_dir = PathBuf::from(dir);
        }

        read_into("PAPER_BALANCE", &mut config.paper_balance)?;
        read_into("RETENTION_CAP", &mut config.store.retention_cap)?;
        read_into("BACKFILL_LIMIT", &mut config.store.backfill_limit)?;
        read_into("RISK_FRACTION", &mut config.risk.risk_fraction)?;
        read_into("MIN_BALANCE", &mut config.risk.min_balance)?;
        read_into("REFRESH_INTERVAL_SECONDS", &mut config.schedule.refresh_interval_seconds)?;
        read_into("EVICTION_INTERVAL_SECONDS", &mut config.schedule.eviction_interval_seconds)?;
        read_into("EVAL_INTERVAL_SECONDS", &mut config.schedule.evaluation_interval_seconds)?;
        read_into("FETCH_TIMEOUT_MS", &mut config.schedule.fetch_timeout_ms)?;
        read_into("ORDER_TIMEOUT_MS", &mut config.schedule.order_timeout_ms)?;
        read_into("PRICE_TIMEOUT_MS", &mut config.monitor.price_timeout_ms)?;

        if let Some(activation) = read_value::<Decimal>("TRAILING_ACTIVATION_PCT")? {
            let trailing = config.monitor.trailing.get_or_insert_with(TrailingConfig::default);
            trailing.activation_pct = activation;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::Missing("SYMBOLS".to_string()));
        }
        if self.intervals.is_empty() {
            return Err(ConfigError::Missing("INTERVALS".to_string()));
        }

        let cfg = &self.indicators;
        for (key, period) in [
            ("SMA_PERIOD", cfg.sma_period),
            ("RSI_PERIOD", cfg.rsi_period),
            ("CCI_PERIOD", cfg.cci_period),
        ] {
            if period == 0 {
                return Err(invalid(key, period));
            }
        }
        if cfg.rsi_oversold >= cfg.rsi_overbought {
            return Err(invalid("RSI_OVERSOLD", cfg.rsi_oversold));
        }
        if cfg.cci_oversold + cfg.cci_band_margin >= cfg.cci_overbought - cfg.cci_band_margin {
            return Err(invalid("CCI_OVERSOLD", cfg.cci_oversold));
        }

        if self.risk.risk_fraction <= Decimal::ZERO || self.risk.risk_fraction > Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                key: "RISK_FRACTION".to_string(),
                value: self.risk.risk_fraction.to_string(),
            });
        }
        if self.store.retention_cap < self.indicators.required_bars() {
            return Err(ConfigError::InvalidValue {
                key: "RETENTION_CAP".to_string(),
                value: self.store.retention_cap.to_string(),
            });
        }
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn read_list(key: &str) -> Option<Vec<String>> {
    env::var(key).ok().map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
}

fn read_value<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
        Err(_) => Ok(None),
    }
}

fn read_into<T: FromStr>(key: &str, target: &mut T) -> Result<(), ConfigError> {
    if let Some(value) = read_value(key)? {
        *target = value;
    }
    Ok(())
}
