//! Stalker: candle cache, signal pipeline and trade lifecycle for exchange symbols.

pub mod cache;
pub mod config;
pub mod core;
pub mod db;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod models;
pub mod patterns;
pub mod risk;
pub mod services;
pub mod signals;
pub mod trading;

pub use error::{Result, StalkerError};
