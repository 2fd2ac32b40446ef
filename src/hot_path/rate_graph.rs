//! Live conversion rate graph
//!
//! Directed, weighted graph over the fixed currency set.
//! `rate[from][to]` is how many units of `to` one unit of `from` buys.
//!
//! HFT: cells are `AtomicU64` holding `f64` bits. Every write replaces one
//! cell with a single store, so the feed task can write while a scan reads
//! without any lock. Cross-cell consistency is not required.

use crate::core::{valid_price, Currency, CurrencySet, Quote};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Bits of `0.0f64`, the "unknown edge" sentinel
const UNKNOWN: u64 = 0;

/// Default taker fee applied per hop when fees are enabled (0.075%)
pub const DEFAULT_FEE_RATE: f64 = 0.00075;

/// Fee rates that keep every fee-scaled rate positive: `[0, 1)`
#[inline]
pub fn valid_fee_rate(fee_rate: f64) -> bool {
    (0.0..1.0).contains(&fee_rate)
}

/// Read access to a set of rates
///
/// Implemented by the live graph and by point-in-time snapshots so the
/// detector can scan either.
pub trait RateSource {
    /// Vertex set the rates are indexed by
    fn currencies(&self) -> &CurrencySet;

    /// Rate from `from` to `to`
    ///
    /// 1 for `from == to`, 0 for an unknown edge, otherwise the stored
    /// rate scaled by `1 - fee_rate` when fees are included.
    fn rate(&self, from: Currency, to: Currency) -> f64;

    /// Whether reads are fee-adjusted
    fn includes_fees(&self) -> bool;
}

/// Which directions an update actually wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// `rate[quote][base]` written from the ask
    pub buy_side: bool,
    /// `rate[base][quote]` written from the bid
    pub sell_side: bool,
}

impl UpdateOutcome {
    #[inline(always)]
    pub fn any(&self) -> bool {
        self.buy_side || self.sell_side
    }
}

/// Known edge, as stored (fee-free)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: Currency,
    pub to: Currency,
    pub rate: f64,
}

/// Shared rate matrix
pub struct RateGraph {
    currencies: CurrencySet,
    /// Row-major `n * n` cells, diagonal never written
    cells: Box<[AtomicU64]>,
    include_fees: AtomicBool,
    fee_rate: f64,
}

impl RateGraph {
    /// Create an empty graph (every edge unknown)
    ///
    /// A `fee_rate` outside `[0, 1)` is replaced by `DEFAULT_FEE_RATE`.
    pub fn new(currencies: CurrencySet, fee_rate: f64) -> Self {
        let fee_rate = if valid_fee_rate(fee_rate) {
            fee_rate
        } else {
            tracing::warn!(fee_rate, fallback = DEFAULT_FEE_RATE, "Fee rate out of range");
            DEFAULT_FEE_RATE
        };

        let n = currencies.len();
        let cells = (0..n * n).map(|_| AtomicU64::new(UNKNOWN)).collect();
        Self {
            currencies,
            cells,
            include_fees: AtomicBool::new(false),
            fee_rate,
        }
    }

    /// Cell index, `None` for self-loops and foreign currencies
    #[inline(always)]
    fn cell(&self, from: Currency, to: Currency) -> Option<usize> {
        let n = self.currencies.len();
        let (f, t) = (from.index(), to.index());
        if f == t || f >= n || t >= n {
            return None;
        }
        Some(f * n + t)
    }

    /// Apply a bid/ask quote for the pair `base/quote` (1 base = price quote)
    ///
    /// - `rate[quote][base] = ask` (cost to buy base using quote)
    /// - `rate[base][quote] = 1 / bid` (proceeds from selling base for quote)
    ///
    /// Each direction is written only if its source price is finite and
    /// positive; a bad side leaves that cell untouched and never affects
    /// the other direction.
    pub fn update(&self, base: Currency, quote: Currency, bid: f64, ask: f64) -> UpdateOutcome {
        let mut outcome = UpdateOutcome::default();

        if let Some(ask) = valid_price(ask) {
            outcome.buy_side = self.set_rate(quote, base, ask);
        }
        if let Some(bid) = valid_price(bid) {
            outcome.sell_side = self.set_rate(base, quote, 1.0 / bid);
        }

        outcome
    }

    /// Apply a resolved quote; absent sides are skipped
    #[inline]
    pub fn apply(&self, quote: &Quote) -> UpdateOutcome {
        self.update(
            quote.pair.base,
            quote.pair.quote,
            quote.bid.unwrap_or(0.0),
            quote.ask.unwrap_or(0.0),
        )
    }

    /// Replace one cell
    ///
    /// Returns false (and writes nothing) for self-loops, foreign
    /// currencies, and rates that are not finite and positive.
    pub fn set_rate(&self, from: Currency, to: Currency, rate: f64) -> bool {
        let (Some(idx), Some(rate)) = (self.cell(from, to), valid_price(rate)) else {
            return false;
        };
        self.cells[idx].store(rate.to_bits(), Ordering::Relaxed);
        true
    }

    /// Stored rate without fee adjustment
    #[inline]
    pub fn stored_rate(&self, from: Currency, to: Currency) -> Option<f64> {
        let idx = self.cell(from, to)?;
        let bits = self.cells[idx].load(Ordering::Relaxed);
        (bits != UNKNOWN).then(|| f64::from_bits(bits))
    }

    /// Toggle fee adjustment for all subsequent reads
    pub fn set_fees(&self, enabled: bool) {
        self.include_fees.store(enabled, Ordering::Relaxed);
    }

    /// Per-hop fee rate
    #[inline(always)]
    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    /// Number of known (directed) edges
    pub fn known_edges(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.load(Ordering::Relaxed) != UNKNOWN)
            .count()
    }

    /// All known edges in row-major order
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for from in self.currencies.iter() {
            for to in self.currencies.iter() {
                if let Some(rate) = self.stored_rate(from, to) {
                    edges.push(Edge { from, to, rate });
                }
            }
        }
        edges
    }

    /// Copy every cell and the fee flag
    ///
    /// Cells are read one at a time, so a snapshot may mix rates from
    /// slightly different update times. The fee flag is fixed for the
    /// lifetime of the snapshot.
    pub fn snapshot(&self) -> RateSnapshot {
        RateSnapshot {
            currencies: self.currencies.clone(),
            cells: self
                .cells
                .iter()
                .map(|c| f64::from_bits(c.load(Ordering::Relaxed)))
                .collect(),
            include_fees: self.includes_fees(),
            fee_rate: self.fee_rate,
        }
    }
}

impl RateSource for RateGraph {
    #[inline(always)]
    fn currencies(&self) -> &CurrencySet {
        &self.currencies
    }

    #[inline]
    fn rate(&self, from: Currency, to: Currency) -> f64 {
        if from == to {
            return 1.0;
        }
        match self.stored_rate(from, to) {
            Some(rate) => fee_adjusted(rate, self.includes_fees(), self.fee_rate),
            None => 0.0,
        }
    }

    #[inline(always)]
    fn includes_fees(&self) -> bool {
        self.include_fees.load(Ordering::Relaxed)
    }
}

#[inline(always)]
fn fee_adjusted(rate: f64, include_fees: bool, fee_rate: f64) -> f64 {
    if include_fees {
        rate * (1.0 - fee_rate)
    } else {
        rate
    }
}

/// Point-in-time copy of a `RateGraph`
#[derive(Debug, Clone)]
pub struct RateSnapshot {
    currencies: CurrencySet,
    cells: Vec<f64>,
    include_fees: bool,
    fee_rate: f64,
}

impl RateSource for RateSnapshot {
    #[inline(always)]
    fn currencies(&self) -> &CurrencySet {
        &self.currencies
    }

    #[inline]
    fn rate(&self, from: Currency, to: Currency) -> f64 {
        if from == to {
            return 1.0;
        }
        let n = self.currencies.len();
        let (f, t) = (from.index(), to.index());
        if f >= n || t >= n {
            return 0.0;
        }
        let rate = self.cells[f * n + t];
        if rate > 0.0 {
            fee_adjusted(rate, self.include_fees, self.fee_rate)
        } else {
            0.0
        }
    }

    #[inline(always)]
    fn includes_fees(&self) -> bool {
        self.include_fees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{currencies, graph};
    use proptest::prelude::*;

    #[test]
    fn test_empty_graph() {
        let g = graph(&["A", "B", "C"]);
        let (a, b) = (Currency::from_raw(0), Currency::from_raw(1));
        assert_eq!(g.rate(a, b), 0.0);
        assert_eq!(g.stored_rate(a, b), None);
        assert_eq!(g.known_edges(), 0);
    }

    #[test]
    fn test_update_sets_both_directions() {
        let set = currencies(&["ETH", "BTC", "USDT"]);
        let (eth, btc) = (set.get("ETH").unwrap(), set.get("BTC").unwrap());
        let g = RateGraph::new(set, DEFAULT_FEE_RATE);

        // ETH/BTC: bid 0.04, ask 0.05
        let outcome = g.update(eth, btc, 0.04, 0.05);
        assert!(outcome.buy_side && outcome.sell_side);

        assert_eq!(g.rate(btc, eth), 0.05);
        assert_eq!(g.rate(eth, btc), 1.0 / 0.04);
        assert_eq!(g.known_edges(), 2);
    }

    #[test]
    fn test_zero_bid_leaves_sell_side_untouched() {
        let g = graph(&["A", "B", "C"]);
        let (a, b) = (Currency::from_raw(0), Currency::from_raw(1));

        g.set_rate(a, b, 0.5);
        let outcome = g.update(a, b, 0.0, 10.0);

        assert_eq!(outcome, UpdateOutcome { buy_side: true, sell_side: false });
        assert_eq!(g.rate(b, a), 10.0);
        assert_eq!(g.rate(a, b), 0.5);
    }

    #[test]
    fn test_bad_ticks_do_not_corrupt() {
        let g = graph(&["A", "B", "C"]);
        let (a, b) = (Currency::from_raw(0), Currency::from_raw(1));
        g.update(a, b, 2.0, 3.0);

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let outcome = g.update(a, b, bad, bad);
            assert!(!outcome.any());
        }

        assert_eq!(g.rate(b, a), 3.0);
        assert_eq!(g.rate(a, b), 0.5);
    }

    #[test]
    fn test_self_loop_never_stored() {
        let g = graph(&["A", "B", "C"]);
        let a = Currency::from_raw(0);
        assert!(!g.set_rate(a, a, 2.0));
        assert_eq!(g.rate(a, a), 1.0);
        assert_eq!(g.known_edges(), 0);
    }

    #[test]
    fn test_foreign_currency_is_unknown() {
        let g = graph(&["A", "B", "C"]);
        let a = Currency::from_raw(0);
        let foreign = Currency::from_raw(9);
        assert!(!g.set_rate(a, foreign, 2.0));
        assert_eq!(g.rate(a, foreign), 0.0);
    }

    #[test]
    fn test_fee_toggle_scales_reads_only() {
        let g = graph(&["A", "B", "C"]);
        let (a, b) = (Currency::from_raw(0), Currency::from_raw(1));
        g.set_rate(a, b, 2.0);

        g.set_fees(true);
        assert!(g.includes_fees());
        assert_eq!(g.rate(a, b), 2.0 * (1.0 - DEFAULT_FEE_RATE));
        assert_eq!(g.stored_rate(a, b), Some(2.0));

        // Unknown edges stay 0 with fees on
        assert_eq!(g.rate(b, a), 0.0);

        g.set_fees(false);
        assert_eq!(g.rate(a, b), 2.0);
    }

    #[test]
    fn test_out_of_range_fee_rate_falls_back() {
        let (a, b) = (Currency::from_raw(0), Currency::from_raw(1));
        for fee in [1.0, 1.5, -0.1, f64::NAN, f64::INFINITY] {
            let g = RateGraph::new(CurrencySet::new(["A", "B", "C"]).unwrap(), fee);
            assert_eq!(g.fee_rate(), DEFAULT_FEE_RATE);

            g.set_rate(a, b, 2.0);
            g.set_fees(true);
            assert!(g.rate(a, b) > 0.0);
        }

        let g = RateGraph::new(CurrencySet::new(["A", "B", "C"]).unwrap(), 0.0);
        assert_eq!(g.fee_rate(), 0.0);
        assert!(valid_fee_rate(0.999));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let g = graph(&["A", "B", "C"]);
        let (a, b) = (Currency::from_raw(0), Currency::from_raw(1));
        g.set_rate(a, b, 2.0);
        g.set_fees(true);

        let snap = g.snapshot();
        g.set_rate(a, b, 4.0);
        g.set_fees(false);

        assert!(snap.includes_fees());
        assert_eq!(snap.rate(a, b), 2.0 * (1.0 - DEFAULT_FEE_RATE));
        assert_eq!(snap.rate(b, a), 0.0);
        assert_eq!(snap.rate(a, a), 1.0);
        assert_eq!(g.rate(a, b), 4.0);
    }

    #[test]
    fn test_edges_listing() {
        let g = graph(&["A", "B", "C"]);
        let (a, b, c) = (Currency::from_raw(0), Currency::from_raw(1), Currency::from_raw(2));
        g.set_rate(c, a, 3.0);
        g.set_rate(a, b, 2.0);

        let edges = g.edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0], Edge { from: a, to: b, rate: 2.0 });
        assert_eq!(edges[1], Edge { from: c, to: a, rate: 3.0 });
    }

    #[test]
    fn test_concurrent_writers_never_tear() {
        use std::sync::Arc;

        let g = Arc::new(graph(&["A", "B", "C"]));
        let (a, b) = (Currency::from_raw(0), Currency::from_raw(1));

        let handles: Vec<_> = [2.0, 4.0]
            .into_iter()
            .map(|value| {
                let g = g.clone();
                std::thread::spawn(move || {
                    for _ in 0..10_000 {
                        g.set_rate(a, b, value);
                    }
                })
            })
            .collect();

        for _ in 0..10_000 {
            let r = g.rate(a, b);
            assert!(r == 0.0 || r == 2.0 || r == 4.0);
        }
        for h in handles {
            h.join().unwrap();
        }
    }

    proptest! {
        #[test]
        fn prop_self_rate_is_one(rates in proptest::collection::vec(0.001f64..1000.0, 6), fees: bool) {
            let g = graph(&["A", "B", "C"]);
            let set = g.currencies().clone();
            let mut i = 0;
            for from in set.iter() {
                for to in set.iter() {
                    if from != to {
                        g.set_rate(from, to, rates[i]);
                        i += 1;
                    }
                }
            }
            g.set_fees(fees);
            for x in set.iter() {
                prop_assert_eq!(g.rate(x, x), 1.0);
            }
        }

        #[test]
        fn prop_fees_never_raise_a_rate(rate in 0.0001f64..1e6, fee in 0.0f64..0.1) {
            let g = RateGraph::new(currencies(&["A", "B", "C"]), fee);
            let (a, b) = (Currency::from_raw(0), Currency::from_raw(1));
            g.set_rate(a, b, rate);
            let plain = g.rate(a, b);
            g.set_fees(true);
            prop_assert!(g.rate(a, b) <= plain);
        }
    }
}
