//! Live triangular arbitrage detector
//!
//! # Architecture
//! - **core**: Currency set, pair table, ticker types
//! - **hot_path**: Rate graph, cycle detector, result sinks
//! - **exchanges**: Binance ticker feed and the reconnecting stream adapter
//! - **ws**: WebSocket connection
//! - **infrastructure**: Cold path (logging, metrics, config, api)

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Level;
use vector_cycle::engine::AppEngine;
use vector_cycle::exchanges::StreamAdapter;
use vector_cycle::hot_path::{CycleDetector, LogSink, RateGraph, WatchSink};
use vector_cycle::infrastructure::{init_logging, start_server, AppState, MetricsCollector};
use vector_cycle::{log_main, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration (config.toml or $CONFIG_PATH)")?;

    // Guards flush file logs on drop
    let _guards = init_logging(&config.logging).context("Failed to initialize logging system")?;

    let currencies = config
        .market
        .currency_set()
        .context("Invalid market.currencies")?;
    log_main!(Level::INFO, %currencies, fee_rate = config.market.fee_rate, "Starting detector");

    // 1. Shared state
    let graph = Arc::new(RateGraph::new(currencies, config.market.fee_rate));
    graph.set_fees(config.market.include_fees);
    let metrics = Arc::new(MetricsCollector::new());

    // 2. Engine and sinks
    let detector = CycleDetector::new(
        config.detector.threshold_policy(),
        config.detector.max_results,
    );
    let mut engine = AppEngine::new(
        graph.clone(),
        detector,
        metrics.clone(),
        config.detector.scan_interval(),
    );

    let (watch_sink, reports) = WatchSink::channel();
    engine.add_sink(Box::new(watch_sink));
    if config.sink.log_cycles {
        engine.add_sink(Box::new(LogSink::new(config.sink.log_history)));
    }

    // 3. Feed
    let adapter = StreamAdapter::new(
        config.feed.transport(),
        graph.clone(),
        config.feed.reconnect_policy(),
    )
    .with_metrics(metrics.clone());
    let feed = adapter.monitor();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 4. API Server (Cold Path)
    let api = config.api.enabled.then(|| {
        let state = AppState {
            graph: graph.clone(),
            reports,
            metrics: metrics.clone(),
            feed,
        };
        let port = config.api.port;
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = start_server(state, port, shutdown).await {
                log_main!(Level::ERROR, error = %e, "API Server failed");
            }
        })
    });

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log_main!(Level::INFO, "Shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => log_main!(Level::ERROR, error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    // Run engine (this blocks until shutdown or the feed gives up)
    engine
        .run(adapter, shutdown_rx)
        .await
        .context("Price feed stopped")?;

    if let Some(api) = api {
        let _ = api.await;
    }

    log_main!(Level::INFO, "Shutdown complete");
    Ok(())
}
