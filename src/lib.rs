//! Live triangular arbitrage detector
//!
//! Core library: a currency rate graph fed by a streaming ticker feed,
//! scanned on a fixed cadence for profitable three-hop cycles.

pub mod core;
pub mod exchanges;
pub mod hot_path;
pub mod infrastructure;
pub mod ws;
pub mod engine;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use infrastructure::config::{Config, DetectorConfig, FeedConfig, MarketConfig};
pub use engine::AppEngine;

use thiserror::Error;

/// Main error type for the detector
#[derive(Error, Debug)]
pub enum ArbError {
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed gave up after {attempts} reconnect attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ArbError>;
