//! Candle time frames

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::config::ConfigError;

/// Supported kline intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "3m")]
    ThreeMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "2h")]
    TwoHours,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "1w")]
    OneWeek,
}

impl Interval {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::ThreeMinutes => "3m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::TwoHours => "2h",
            Self::FourHours => "4h",
            Self::SixHours => "6h",
            Self::TwelveHours => "12h",
            Self::OneDay => "1d",
            Self::OneWeek => "1w",
        }
    }

    /// Interval code used by the exchange kline endpoint.
    pub const fn exchange_code(self) -> &'static str {
        match self {
            Self::OneMinute => "1",
            Self::ThreeMinutes => "3",
            Self::FiveMinutes => "5",
            Self::FifteenMinutes => "15",
            Self::ThirtyMinutes => "30",
            Self::OneHour => "60",
            Self::TwoHours => "120",
            Self::FourHours => "240",
            Self::SixHours => "360",
            Self::TwelveHours => "720",
            Self::OneDay => "D",
            Self::OneWeek => "W",
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1m" | "1" => Ok(Self::OneMinute),
            "3m" | "3" => Ok(Self::ThreeMinutes),
            "5m" | "5" => Ok(Self::FiveMinutes),
            "15m" | "15" => Ok(Self::FifteenMinutes),
            "30m" | "30" => Ok(Self::ThirtyMinutes),
            "1h" | "60" => Ok(Self::OneHour),
            "2h" | "120" => Ok(Self::TwoHours),
            "4h" | "240" => Ok(Self::FourHours),
            "6h" | "360" => Ok(Self::SixHours),
            "12h" | "720" => Ok(Self::TwelveHours),
            "1d" | "d" => Ok(Self::OneDay),
            "1w" | "w" => Ok(Self::OneWeek),
            other => Err(ConfigError::InvalidValue {
                key: "interval".to_string(),
                value: other.to_string(),
            }),
        }
    }
}
