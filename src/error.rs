//! Error types shared across the pipeline

use crate::config::ConfigError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StalkerError {
    #[error("No data for {symbol} {interval}: {reason}")]
    DataUnavailable {
        symbol: String,
        interval: String,
        reason: String,
    },

    #[error("Insufficient data: {available} bars available, {required} required")]
    InsufficientData { required: usize, available: usize },

    #[error("Insufficient balance: {balance} is below the minimum of {minimum}")]
    InsufficientBalance { balance: Decimal, minimum: Decimal },

    #[error("External call '{operation}' failed: {message}")]
    ExternalCall { operation: String, message: String },

    #[error("External call '{operation}' timed out after {after_ms}ms")]
    Timeout { operation: String, after_ms: u64 },

    #[error("Invalid signal state: {0}")]
    InvalidSignalState(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Journal IO error: {0}")]
    Journal(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StalkerError {
    pub fn external(operation: impl Into<String>, message: impl ToString) -> Self {
        Self::ExternalCall {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// True for failures that only mean "nothing to act on this tick".
    pub fn is_data_shortage(&self) -> bool {
        matches!(
            self,
            Self::DataUnavailable { .. } | Self::InsufficientData { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StalkerError>;
