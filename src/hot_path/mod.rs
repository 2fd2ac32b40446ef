//! Hot path operations - lock-free rate reads and writes
//!
//! This module contains the latency-sensitive code:
//! - Rate graph updates and reads
//! - Triangular cycle scans
//! - Result publication

pub mod detector;
pub mod rate_graph;
pub mod sink;

pub use detector::{Cycle, CycleDetector, PathKey, ScanReport, ScanStats, ThresholdPolicy};
pub use rate_graph::{Edge, RateGraph, RateSnapshot, RateSource, UpdateOutcome};
pub use sink::{LogSink, ResultSink, WatchSink};
