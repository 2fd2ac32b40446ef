//! Configuration management for the detector
//!
//! Loads configuration from config.toml at startup.
//! All values are configurable to avoid hardcoded constants.

use crate::core::{CurrencyError, CurrencySet};
use crate::exchanges::{BinanceTickerFeed, ReconnectPolicy};
use crate::hot_path::detector::{ThresholdPolicy, DEFAULT_MARGIN, DEFAULT_MAX_RESULTS};
use crate::hot_path::rate_graph::{valid_fee_rate, DEFAULT_FEE_RATE};
use crate::hot_path::sink::DEFAULT_LOG_HISTORY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Detector configuration
///
/// Loaded from config.toml at startup. Every field has a default so an
/// empty or missing file is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub market: MarketConfig,

    #[serde(default)]
    pub detector: DetectorConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub sink: SinkConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Currency set and fee model
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketConfig {
    /// Graph vertices, in iteration order
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,

    /// Per-hop taker fee (0.00075 = 0.075%)
    #[serde(default = "default_fee_rate")]
    pub fee_rate: f64,

    /// Start with fee-adjusted rates
    #[serde(default)]
    pub include_fees: bool,
}

/// Scan threshold and cadence
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetectorConfig {
    /// Profitability margin over break-even (0.0001 = 1 bp)
    #[serde(default = "default_margin")]
    pub margin: f64,

    /// Margin used instead of `margin` while fees are on
    #[serde(default)]
    pub fee_margin: Option<f64>,

    /// Cycles returned per scan
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,

    /// 1..=10; overrides `scan_interval_ms` when set
    #[serde(default)]
    pub scan_speed: Option<u8>,
}

/// Feed endpoint and reconnect schedule
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub url: String,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Consecutive failed attempts before giving up; unset retries forever
    #[serde(default)]
    pub max_retries: Option<u32>,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Silence after which a connection is treated as dropped
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
}

/// Result sinks
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SinkConfig {
    /// Log newly seen cycles
    #[serde(default = "default_true")]
    pub log_cycles: bool,

    /// Logged path labels remembered before the history is reset
    #[serde(default = "default_log_history")]
    pub log_history: usize,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Port for HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Write rolling log files in addition to the console
    #[serde(default = "default_true")]
    pub file_logging: bool,

    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            currencies: default_currencies(),
            fee_rate: default_fee_rate(),
            include_fees: false,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            fee_margin: None,
            max_results: default_max_results(),
            scan_interval_ms: default_scan_interval_ms(),
            scan_speed: None,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_retries: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            stale_after_ms: default_stale_after_ms(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            log_cycles: true,
            log_history: default_log_history(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_api_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_logging: true,
            dir: default_log_dir(),
        }
    }
}

fn default_currencies() -> Vec<String> {
    ["BTC", "ETH", "SOL", "BNB", "USDT", "USDC"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_fee_rate() -> f64 {
    DEFAULT_FEE_RATE
}

fn default_margin() -> f64 {
    DEFAULT_MARGIN
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_scan_interval_ms() -> u64 {
    1000
}

fn default_feed_url() -> String {
    BinanceTickerFeed::WS_URL.to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_stale_after_ms() -> u64 {
    30_000
}

fn default_log_history() -> usize {
    DEFAULT_LOG_HISTORY
}

fn default_api_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from `$CONFIG_PATH` or config.toml
    ///
    /// If the file doesn't exist, returns default configuration.
    /// # Errors
    /// Returns error if file exists but cannot be parsed or fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        let config = match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File not found - use defaults
                Config::default()
            }
            Err(e) => return Err(ConfigError::IoError(e)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse without validating
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Reject values the detector cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.market.currency_set()?;

        let fee = self.market.fee_rate;
        if !valid_fee_rate(fee) {
            return Err(ConfigError::Invalid(format!(
                "market.fee_rate must be in [0, 1), got {fee}"
            )));
        }

        let d = &self.detector;
        if !(d.margin.is_finite() && d.margin >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "detector.margin must be >= 0, got {}",
                d.margin
            )));
        }
        if let Some(m) = d.fee_margin {
            if !(m.is_finite() && m >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "detector.fee_margin must be >= 0, got {m}"
                )));
            }
        }
        if d.max_results == 0 {
            return Err(ConfigError::Invalid("detector.max_results must be > 0".into()));
        }
        if d.scan_interval_ms == 0 {
            return Err(ConfigError::Invalid("detector.scan_interval_ms must be > 0".into()));
        }
        if let Some(speed) = d.scan_speed {
            if !(1..=10).contains(&speed) {
                return Err(ConfigError::Invalid(format!(
                    "detector.scan_speed must be 1..=10, got {speed}"
                )));
            }
        }

        let url = url::Url::parse(&self.feed.url)
            .map_err(|e| ConfigError::Invalid(format!("feed.url: {e}")))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::Invalid(format!(
                "feed.url must be ws:// or wss://, got {}",
                url.scheme()
            )));
        }

        Ok(())
    }
}

impl MarketConfig {
    /// Build the vertex set
    pub fn currency_set(&self) -> Result<CurrencySet, CurrencyError> {
        CurrencySet::new(&self.currencies)
    }
}

impl DetectorConfig {
    /// Scan cadence; `scan_speed` wins over `scan_interval_ms`
    pub fn scan_interval(&self) -> Duration {
        match self.scan_speed {
            Some(speed) => {
                let ms = 3000u64.saturating_sub(u64::from(speed) * 250).max(500);
                Duration::from_millis(ms)
            }
            None => Duration::from_millis(self.scan_interval_ms),
        }
    }

    pub fn threshold_policy(&self) -> ThresholdPolicy {
        ThresholdPolicy {
            margin: self.margin,
            fee_margin: self.fee_margin,
        }
    }
}

impl FeedConfig {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            delay: Duration::from_millis(self.reconnect_delay_ms),
            max_retries: self.max_retries,
        }
    }

    pub fn transport(&self) -> BinanceTickerFeed {
        BinanceTickerFeed::new(self.url.clone()).with_timeouts(
            Duration::from_millis(self.connect_timeout_ms),
            Duration::from_millis(self.stale_after_ms),
        )
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading file
    IoError(std::io::Error),
    /// Parse error (invalid TOML)
    ParseError(String),
    /// Bad currency set
    Currency(CurrencyError),
    /// Value out of range
    Invalid(String),
}

impl From<CurrencyError> for ConfigError {
    fn from(e: CurrencyError) -> Self {
        ConfigError::Currency(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::ParseError(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Currency(e) => write!(f, "Invalid market.currencies: {}", e),
            ConfigError::Invalid(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            ConfigError::Currency(e) => Some(e),
            ConfigError::ParseError(_) | ConfigError::Invalid(_) => None,
        }
    }
}

impl From<ConfigError> for crate::ArbError {
    fn from(e: ConfigError) -> Self {
        crate::ArbError::Config(e.to_string())
    }
}
