//! Infrastructure - cold path only
//!
//! This module contains non-latency-critical code:
//! - Logging and metrics
//! - Configuration management
//! - HTTP API

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;

pub use api::{start_server, AppState};
pub use config::{ApiConfig, Config, ConfigError, LoggingConfig, SinkConfig};
pub use logging::init_logging;
pub use metrics::{MetricsCollector, MetricsSnapshot};
