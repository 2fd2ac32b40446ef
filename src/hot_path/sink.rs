//! Result sinks
//!
//! Consumers of ranked scan results. The engine publishes every report to
//! each registered sink on the scan cadence.

use crate::core::CurrencySet;
use crate::hot_path::ScanReport;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Default number of recently logged cycles remembered by `LogSink`
pub const DEFAULT_LOG_HISTORY: usize = 50;

/// Consumer of ranked cycle lists
pub trait ResultSink: Send {
    /// Sink name (for logging)
    fn name(&self) -> &'static str;

    /// Consume one scan result
    fn publish(&mut self, report: &ScanReport, currencies: &CurrencySet);
}

/// Logs newly profitable cycles
///
/// A cycle is logged once until the bounded history fills up; the
/// history is then cleared wholesale and logging starts over.
#[derive(Debug)]
pub struct LogSink {
    recent: HashSet<String>,
    capacity: usize,
    logged: u64,
}

impl LogSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            recent: HashSet::with_capacity(capacity + 1),
            capacity,
            logged: 0,
        }
    }

    /// Labels of profitable cycles in the report not logged recently
    ///
    /// Records them in the history.
    pub fn fresh_cycles(&mut self, report: &ScanReport, currencies: &CurrencySet) -> Vec<(String, f64)> {
        let mut fresh = Vec::new();

        for cycle in report.cycles.iter().filter(|c| c.profitable) {
            let label = cycle.label(currencies);
            if self.recent.insert(label.clone()) {
                fresh.push((label, cycle.spread));
            }
        }

        if self.recent.len() > self.capacity {
            self.recent.clear();
        }

        fresh
    }

    /// Total cycles logged since construction
    pub fn logged(&self) -> u64 {
        self.logged
    }

    /// Cycles currently remembered
    pub fn history_len(&self) -> usize {
        self.recent.len()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_HISTORY)
    }
}

impl ResultSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    fn publish(&mut self, report: &ScanReport, currencies: &CurrencySet) {
        for (label, spread) in self.fresh_cycles(report, currencies) {
            self.logged += 1;
            crate::log_scan!(
                tracing::Level::INFO,
                path = %label,
                spread = %format!("{:+.3}%", spread),
                "ARBITRAGE"
            );
        }

        crate::log_scan!(
            tracing::Level::DEBUG,
            evaluated = report.evaluated,
            profitable = report.profitable_count,
            fees = report.include_fees,
            "Scan complete ({})",
            report.stats
        );
    }
}

/// Publishes the latest report on a watch channel
///
/// Any number of receivers can pull the most recent result; older
/// reports are overwritten.
#[derive(Debug)]
pub struct WatchSink {
    tx: watch::Sender<Arc<ScanReport>>,
}

impl WatchSink {
    /// Create the sink and a first receiver (holding an empty report)
    pub fn channel() -> (Self, watch::Receiver<Arc<ScanReport>>) {
        let (tx, rx) = watch::channel(Arc::new(ScanReport::default()));
        (Self { tx }, rx)
    }

    /// Additional receiver
    pub fn subscribe(&self) -> watch::Receiver<Arc<ScanReport>> {
        self.tx.subscribe()
    }
}

impl ResultSink for WatchSink {
    fn name(&self) -> &'static str {
        "watch"
    }

    fn publish(&mut self, report: &ScanReport, _currencies: &CurrencySet) {
        // No receivers is fine: the value is kept for later subscribers
        self.tx.send_replace(Arc::new(report.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hot_path::CycleDetector;
    use crate::test_utils::graph_with_rates;
    use crate::hot_path::RateSource;

    fn profitable_report() -> (ScanReport, CurrencySet) {
        let g = graph_with_rates(&["A", "B", "C"], &[("A", "B", 2.0), ("B", "C", 2.0), ("C", "A", 0.3)]);
        let report = CycleDetector::default().scan_report(&g);
        (report, g.currencies().clone())
    }

    #[test]
    fn test_log_sink_dedupes() {
        let (report, set) = profitable_report();
        let mut sink = LogSink::default();

        let fresh = sink.fresh_cycles(&report, &set);
        assert_eq!(fresh.len(), 3);
        assert_eq!(fresh[0].0, "A → B → C → A");

        // Same cycles again: nothing new
        assert!(sink.fresh_cycles(&report, &set).is_empty());
        assert_eq!(sink.history_len(), 3);
    }

    #[test]
    fn test_log_sink_history_resets_when_full() {
        let (report, set) = profitable_report();
        let mut sink = LogSink::new(2);

        // 3 entries > capacity 2: history cleared after this batch
        assert_eq!(sink.fresh_cycles(&report, &set).len(), 3);
        assert_eq!(sink.history_len(), 0);
        assert_eq!(sink.fresh_cycles(&report, &set).len(), 3);
    }

    #[test]
    fn test_log_sink_publish_counts() {
        let (report, set) = profitable_report();
        let mut sink = LogSink::default();
        sink.publish(&report, &set);
        sink.publish(&report, &set);
        assert_eq!(sink.logged(), 3);
    }

    #[test]
    fn test_watch_sink_latest_wins() {
        let (report, set) = profitable_report();
        let (mut sink, rx) = WatchSink::channel();
        let late = sink.subscribe();

        assert!(rx.borrow().cycles.is_empty());

        sink.publish(&ScanReport::default(), &set);
        sink.publish(&report, &set);

        assert_eq!(rx.borrow().cycles.len(), 3);
        assert_eq!(late.borrow().stats, report.stats);
    }
}
