//! Core Application Engine
//!
//! Runs the feed adapter on its own task and scans the rate graph on a
//! fixed cadence, independent of message arrival. Each scan reads a
//! point-in-time snapshot, so the feed keeps writing while it runs.

use crate::exchanges::stream::shutdown_requested;
use crate::exchanges::{FeedTransport, StreamAdapter};
use crate::hot_path::{CycleDetector, RateGraph, RateSource, ResultSink, ScanReport};
use crate::infrastructure::metrics::MetricsCollector;
use crate::{log_main, log_scan, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::Level;

/// Scan loop and result fan-out
pub struct AppEngine {
    graph: Arc<RateGraph>,
    detector: CycleDetector,
    sinks: Vec<Box<dyn ResultSink>>,
    metrics: Arc<MetricsCollector>,
    scan_interval: Duration,
}

impl AppEngine {
    /// Create new engine over a shared graph
    pub fn new(
        graph: Arc<RateGraph>,
        detector: CycleDetector,
        metrics: Arc<MetricsCollector>,
        scan_interval: Duration,
    ) -> Self {
        Self {
            graph,
            detector,
            sinks: Vec::new(),
            metrics,
            scan_interval,
        }
    }

    /// Add result sink
    pub fn add_sink(&mut self, sink: Box<dyn ResultSink>) {
        log_main!(Level::DEBUG, sink = sink.name(), "Sink registered");
        self.sinks.push(sink);
    }

    pub fn graph(&self) -> Arc<RateGraph> {
        self.graph.clone()
    }

    /// Get metrics collector reference
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    /// One cadence tick: snapshot, scan, publish
    pub fn scan_once(&mut self) -> ScanReport {
        let snapshot = self.graph.snapshot();
        let report = self.detector.scan_report(&snapshot);

        for sink in &mut self.sinks {
            sink.publish(&report, snapshot.currencies());
        }

        self.metrics.record_scan();
        report
    }

    /// Run the feed and the scan loop until shutdown
    ///
    /// Returns the feed's error if it gives up reconnecting.
    pub async fn run<T>(
        mut self,
        adapter: StreamAdapter<T>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()>
    where
        T: FeedTransport + 'static,
    {
        log_main!(
            Level::INFO,
            currencies = %self.graph.currencies(),
            interval_ms = self.scan_interval.as_millis() as u64,
            sinks = self.sinks.len(),
            "Starting AppEngine"
        );

        let mut feed = tokio::spawn(adapter.run(shutdown.clone()));

        let mut ticker = tokio::time::interval(self.scan_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let feed_result = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.scan_once();
                    if !report.newly_profitable.is_empty() {
                        log_scan!(
                            Level::DEBUG,
                            new = report.newly_profitable.len(),
                            "Newly profitable cycles"
                        );
                    }
                }
                res = &mut feed => break Some(res),
                _ = shutdown_requested(&mut shutdown) => break None,
            }
        };

        let joined = match feed_result {
            Some(res) => res,
            None => feed.await,
        };

        log_main!(Level::INFO, stats = %self.detector.stats(), "AppEngine stopped");
        joined.map_err(std::io::Error::from)?
    }
}
