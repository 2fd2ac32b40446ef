//! Benchmarks for the cycle scan
//!
//! O(n³) over the vertex set: the default 6 currencies and a larger 20.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use vector_cycle::core::CurrencySet;
use vector_cycle::hot_path::rate_graph::DEFAULT_FEE_RATE;
use vector_cycle::hot_path::{CycleDetector, RateGraph, RateSource};

const SYMBOLS: [&str; 20] = [
    "BTC", "ETH", "SOL", "BNB", "USDT", "USDC", "XRP", "ADA", "DOGE", "DOT", "LTC", "LINK",
    "AVAX", "TRX", "MATIC", "ATOM", "UNI", "XLM", "ETC", "FIL",
];

/// Fully connected graph with small deterministic mispricings
fn populated_graph(n: usize) -> RateGraph {
    let currencies = CurrencySet::new(&SYMBOLS[..n]).unwrap();
    let graph = RateGraph::new(currencies, DEFAULT_FEE_RATE);
    let ids: Vec<_> = graph.currencies().iter().collect();

    for (i, from) in ids.iter().enumerate() {
        for (j, to) in ids.iter().enumerate() {
            if i == j {
                continue;
            }
            let value = |k: usize| 1.0 + k as f64 * 0.01;
            let skew = 1.0 + ((i * 7 + j * 13) % 5) as f64 * 0.0004;
            graph.set_rate(*from, *to, value(j) / value(i) * skew);
        }
    }
    graph
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    for n in [6, 20] {
        let graph = Arc::new(populated_graph(n));

        group.bench_with_input(BenchmarkId::new("live", n), &graph, |b, graph| {
            let mut detector = CycleDetector::default();
            b.iter(|| black_box(detector.scan(graph.as_ref())))
        });

        group.bench_with_input(BenchmarkId::new("snapshot", n), &graph, |b, graph| {
            let mut detector = CycleDetector::default();
            b.iter(|| {
                let snapshot = graph.snapshot();
                black_box(detector.scan(&snapshot))
            })
        });
    }

    group.finish();
}

fn bench_fee_adjusted_scan(c: &mut Criterion) {
    let graph = populated_graph(20);
    graph.set_fees(true);
    let mut detector = CycleDetector::default();

    c.bench_function("scan_with_fees_20", |b| {
        b.iter(|| black_box(detector.scan(&graph)))
    });
}

criterion_group!(benches, bench_scan, bench_fee_adjusted_scan);
criterion_main!(benches);
