//! Metrics collection for system monitoring
//!
//! Lock-free metrics counters using atomic operations.
//! Updated from the feed and scan tasks, exported via API in cold path.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Instant, SystemTime};

/// System metrics collector
///
/// Thread-safe counters updated from hot path.
/// Snapshots taken for API export.
pub struct MetricsCollector {
    /// Feed payloads received
    messages: AtomicU64,
    /// Tickers that wrote at least one rate
    tickers_applied: AtomicU64,
    /// Tickers whose symbol is not a pair over the currency set
    tickers_unmatched: AtomicU64,
    /// Tickers for a known pair with no usable bid, ask or last price
    tickers_unpriced: AtomicU64,
    /// Ticker elements that failed to decode
    tickers_rejected: AtomicU64,
    /// Payloads that were not decodable at all
    decode_errors: AtomicU64,
    /// Completed scans
    scans: AtomicU64,
    /// Reconnects after a dropped connection
    reconnects: AtomicU64,
    /// Feed connection status
    connected: AtomicBool,
    /// Last message timestamp (Unix millis)
    last_message_time: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

/// Metrics snapshot for API export
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub messages: u64,
    pub tickers_applied: u64,
    pub tickers_unmatched: u64,
    pub tickers_unpriced: u64,
    pub tickers_rejected: u64,
    pub decode_errors: u64,
    pub scans: u64,
    pub reconnects: u64,
    pub connected: bool,
    /// Unix millis of the last payload
    pub last_message_time: Option<u64>,
    pub millis_since_last_message: Option<u64>,
    pub message_rate: f64, // messages per second
    pub uptime_seconds: u64,
}

impl MetricsCollector {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            messages: AtomicU64::new(0),
            tickers_applied: AtomicU64::new(0),
            tickers_unmatched: AtomicU64::new(0),
            tickers_unpriced: AtomicU64::new(0),
            tickers_rejected: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            scans: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            connected: AtomicBool::new(false),
            last_message_time: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a feed payload
    #[inline]
    pub fn record_message(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
        self.last_message_time.store(unix_millis(), Ordering::Relaxed);
    }

    /// Record ticker outcomes for one payload
    #[inline]
    pub fn record_tickers(&self, applied: u64, unmatched: u64, unpriced: u64, rejected: u64) {
        self.tickers_applied.fetch_add(applied, Ordering::Relaxed);
        self.tickers_unmatched.fetch_add(unmatched, Ordering::Relaxed);
        self.tickers_unpriced.fetch_add(unpriced, Ordering::Relaxed);
        self.tickers_rejected.fetch_add(rejected, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Set feed connection status
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Check if the feed is connected
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Unix millis of the last payload, `None` before the first one
    pub fn last_message_time(&self) -> Option<u64> {
        match self.last_message_time.load(Ordering::Relaxed) {
            0 => None,
            last => Some(last),
        }
    }

    /// Milliseconds since the last payload
    pub fn millis_since_last_message(&self) -> Option<u64> {
        self.last_message_time()
            .map(|last| unix_millis().saturating_sub(last))
    }

    /// Get current snapshot of metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let messages = self.messages.load(Ordering::Relaxed);
        let uptime = self.start_time.elapsed().as_secs();
        let rate = if uptime > 0 {
            messages as f64 / uptime as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            messages,
            tickers_applied: self.tickers_applied.load(Ordering::Relaxed),
            tickers_unmatched: self.tickers_unmatched.load(Ordering::Relaxed),
            tickers_unpriced: self.tickers_unpriced.load(Ordering::Relaxed),
            tickers_rejected: self.tickers_rejected.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            connected: self.is_connected(),
            last_message_time: self.last_message_time(),
            millis_since_last_message: self.millis_since_last_message(),
            message_rate: rate,
            uptime_seconds: uptime,
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
