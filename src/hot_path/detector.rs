//! Triangular cycle detector (Warm Path)
//!
//! Enumerates every ordered triple of distinct currencies, compounds the
//! three conversion rates and keeps the triples whose product clears the
//! profitability threshold. Only 3-hop cycles are searched.
//!
//! A scan is a bounded synchronous computation, O(n³) over a small fixed
//! vertex set, so it never yields.

use crate::core::{Currency, CurrencySet};
use crate::hot_path::RateSource;
use std::collections::HashSet;
use std::fmt;

/// Default profitability margin above break-even (1 basis point)
pub const DEFAULT_MARGIN: f64 = 0.0001;

/// Default number of ranked cycles returned per scan
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Identity of a triple: `start-mid1-mid2`, trailing return excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathKey(pub [Currency; 3]);

impl PathKey {
    /// `BTC-ETH-SOL`
    pub fn label(&self, currencies: &CurrencySet) -> String {
        let [a, b, c] = self.0;
        format!(
            "{}-{}-{}",
            currencies.name(a),
            currencies.name(b),
            currencies.name(c)
        )
    }
}

/// One evaluated profitable cycle, created fresh each scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cycle {
    /// start, mid1, mid2, start
    pub path: [Currency; 4],
    /// Rates traversed: start→mid1, mid1→mid2, mid2→start
    pub rates: [f64; 3],
    /// r1 * r2 * r3
    pub product: f64,
    /// (product - 1) * 100
    pub spread: f64,
    /// product > threshold
    pub profitable: bool,
}

impl Cycle {
    #[inline(always)]
    pub fn key(&self) -> PathKey {
        PathKey([self.path[0], self.path[1], self.path[2]])
    }

    /// `BTC → ETH → SOL → BTC`
    pub fn label(&self, currencies: &CurrencySet) -> String {
        self.path
            .iter()
            .map(|c| currencies.name(*c))
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

/// Cumulative counters since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Triples evaluated ever (all three edges known)
    pub total: u64,
    /// Profitable triples that were not profitable in the preceding scan
    pub profitable: u64,
}

/// Profitability threshold
///
/// The threshold is `1 + margin` regardless of fee mode unless
/// `fee_margin` is set, in which case scans over fee-adjusted rates use
/// `1 + fee_margin` instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub margin: f64,
    pub fee_margin: Option<f64>,
}

impl ThresholdPolicy {
    #[inline]
    pub fn threshold(&self, include_fees: bool) -> f64 {
        match (include_fees, self.fee_margin) {
            (true, Some(fee_margin)) => 1.0 + fee_margin,
            _ => 1.0 + self.margin,
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
            fee_margin: None,
        }
    }
}

/// Full result of one scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Top-K profitable cycles, descending by spread
    pub cycles: Vec<Cycle>,
    /// Triples that became profitable in this scan, in discovery order
    pub newly_profitable: Vec<PathKey>,
    /// Profitable triples found in this scan (before truncation)
    pub profitable_count: usize,
    /// Triples evaluated in this scan
    pub evaluated: u64,
    /// Threshold used
    pub threshold: f64,
    /// Whether rates were fee-adjusted
    pub include_fees: bool,
    /// Cumulative counters after this scan
    pub stats: ScanStats,
}

impl fmt::Display for ScanStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "total={} profitable={}", self.total, self.profitable)
    }
}

/// Stateful detector
///
/// Owns the previous scan's profitable path-keys (for first-seen
/// detection) and the cumulative counters.
#[derive(Debug)]
pub struct CycleDetector {
    policy: ThresholdPolicy,
    max_results: usize,
    previous: HashSet<PathKey>,
    stats: ScanStats,
}

impl CycleDetector {
    pub fn new(policy: ThresholdPolicy, max_results: usize) -> Self {
        Self {
            policy,
            max_results,
            previous: HashSet::new(),
            stats: ScanStats::default(),
        }
    }

    /// Ranked top-K profitable cycles
    pub fn scan<S: RateSource + ?Sized>(&mut self, source: &S) -> Vec<Cycle> {
        self.scan_report(source).cycles
    }

    /// Scan and return the ranked cycles with per-scan details
    pub fn scan_report<S: RateSource + ?Sized>(&mut self, source: &S) -> ScanReport {
        let currencies = source.currencies();
        let include_fees = source.includes_fees();
        let threshold = self.policy.threshold(include_fees);

        let mut cycles = Vec::new();
        let mut newly_profitable = Vec::new();
        let mut current = HashSet::with_capacity(self.previous.len());
        let mut evaluated = 0u64;

        for start in currencies.iter() {
            for mid1 in currencies.iter() {
                if mid1 == start {
                    continue;
                }
                for mid2 in currencies.iter() {
                    if mid2 == start || mid2 == mid1 {
                        continue;
                    }

                    let r1 = source.rate(start, mid1);
                    let r2 = source.rate(mid1, mid2);
                    let r3 = source.rate(mid2, start);

                    // Unknown edge: not a failed cycle, just not traversable
                    if r1 == 0.0 || r2 == 0.0 || r3 == 0.0 {
                        continue;
                    }
                    evaluated += 1;

                    let product = r1 * r2 * r3;
                    if product <= threshold {
                        continue;
                    }

                    let key = PathKey([start, mid1, mid2]);
                    if !self.previous.contains(&key) {
                        newly_profitable.push(key);
                    }
                    current.insert(key);

                    cycles.push(Cycle {
                        path: [start, mid1, mid2, start],
                        rates: [r1, r2, r3],
                        product,
                        spread: (product - 1.0) * 100.0,
                        profitable: true,
                    });
                }
            }
        }

        self.previous = current;
        self.stats.total += evaluated;
        self.stats.profitable += newly_profitable.len() as u64;

        let profitable_count = cycles.len();
        // Stable: equal spreads keep discovery order
        cycles.sort_by(|a, b| b.spread.total_cmp(&a.spread));
        cycles.truncate(self.max_results);

        ScanReport {
            cycles,
            newly_profitable,
            profitable_count,
            evaluated,
            threshold,
            include_fees,
            stats: self.stats,
        }
    }

    /// Cumulative counters since construction
    #[inline]
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn policy(&self) -> ThresholdPolicy {
        self.policy
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

impl Default for CycleDetector {
    fn default() -> Self {
        Self::new(ThresholdPolicy::default(), DEFAULT_MAX_RESULTS)
    }
}
