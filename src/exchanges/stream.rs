//! Stream adapter: feed transport → rate graph
//!
//! Owns one transport and keeps it alive forever (or until a retry cap):
//! connect, decode every payload into the graph, and on any drop wait a
//! fixed delay before exactly one new attempt.
//!
//! Status transitions go out on a broadcast channel, one event per
//! `Connected`/`Disconnected` edge. A refused connect is not a
//! transition and emits nothing.

use crate::core::PairTable;
use crate::exchanges::parsing::BinanceTickerParser;
use crate::exchanges::traits::{FeedMessage, FeedTransport};
use crate::hot_path::{RateGraph, RateSource};
use crate::infrastructure::metrics::MetricsCollector;
use crate::ws::ConnectionState;
use crate::{log_feed, ArbError, Result};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::Level;

/// Status channel depth; slow subscribers lag instead of blocking the feed
const STATUS_CAPACITY: usize = 16;

/// Connectivity transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    Connected,
    Disconnected,
}

impl FeedStatus {
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, FeedStatus::Connected)
    }
}

/// Fixed-delay reconnect schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait between a drop (or refused connect) and the next attempt
    pub delay: Duration,
    /// Consecutive failed attempts tolerated; `None` retries forever
    pub max_retries: Option<u32>,
}

impl ReconnectPolicy {
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: Self::DEFAULT_DELAY,
            max_retries: None,
        }
    }
}

/// Ticker outcomes for one payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageOutcome {
    /// Tickers that wrote at least one rate
    pub applied: u64,
    /// Tickers for pairs outside the currency set
    pub unmatched: u64,
    /// Tickers for a known pair with no usable price
    pub unpriced: u64,
    /// Ticker elements that did not decode
    pub rejected: u64,
}

/// Cloneable view of a running adapter
#[derive(Clone)]
pub struct FeedMonitor {
    status: broadcast::Sender<FeedStatus>,
    state: watch::Receiver<ConnectionState>,
}

impl FeedMonitor {
    /// New receiver for status transitions from now on
    pub fn subscribe(&self) -> broadcast::Receiver<FeedStatus> {
        self.status.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

/// Feed adapter
pub struct StreamAdapter<T: FeedTransport> {
    transport: T,
    graph: Arc<RateGraph>,
    pairs: PairTable,
    policy: ReconnectPolicy,
    metrics: Arc<MetricsCollector>,
    status: broadcast::Sender<FeedStatus>,
    state: watch::Sender<ConnectionState>,
}

impl<T: FeedTransport> StreamAdapter<T> {
    /// Create adapter writing into `graph`
    ///
    /// The pair table is built from the graph's own currency set.
    pub fn new(transport: T, graph: Arc<RateGraph>, policy: ReconnectPolicy) -> Self {
        let pairs = PairTable::build(graph.currencies());
        let (status, _) = broadcast::channel(STATUS_CAPACITY);
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            transport,
            graph,
            pairs,
            policy,
            metrics: Arc::new(MetricsCollector::new()),
            status,
            state,
        }
    }

    /// Share a metrics collector with the rest of the app
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Status transitions from now on
    pub fn subscribe(&self) -> broadcast::Receiver<FeedStatus> {
        self.status.subscribe()
    }

    /// Handle that outlives the move into `run`
    pub fn monitor(&self) -> FeedMonitor {
        FeedMonitor {
            status: self.status.clone(),
            state: self.state.subscribe(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    /// Decode one payload and write every usable ticker into the graph
    ///
    /// Never fails: a bad payload is counted and dropped.
    pub fn handle_message(&self, text: &str) -> MessageOutcome {
        self.metrics.record_message();

        let batch = match BinanceTickerParser::parse(text) {
            Ok(batch) => batch,
            Err(e) => {
                self.metrics.record_decode_error();
                log_feed!(Level::DEBUG, error = %e, "Dropping undecodable payload");
                return MessageOutcome::default();
            }
        };

        let mut outcome = MessageOutcome {
            rejected: batch.rejected as u64,
            ..MessageOutcome::default()
        };

        for ticker in &batch.tickers {
            if self.pairs.resolve(&ticker.symbol).is_none() {
                outcome.unmatched += 1;
                continue;
            }
            match ticker.to_quote(&self.pairs) {
                Some(quote) if self.graph.apply(&quote).any() => outcome.applied += 1,
                _ => outcome.unpriced += 1,
            }
        }

        self.metrics.record_tickers(
            outcome.applied,
            outcome.unmatched,
            outcome.unpriced,
            outcome.rejected,
        );
        outcome
    }

    /// Run until shutdown or until the retry cap is exhausted
    ///
    /// Shutdown cancels an in-flight connect, the read loop and a pending
    /// reconnect timer alike.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let exchange = self.transport.exchange().name();
        let mut failures: u32 = 0;

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            self.set_state(ConnectionState::Connecting);
            log_feed!(Level::INFO, exchange, "Connecting");

            let connected = tokio::select! {
                res = self.transport.connect() => res,
                _ = shutdown_requested(&mut shutdown) => break,
            };

            match connected {
                Ok(()) => {
                    failures = 0;
                    self.set_state(ConnectionState::Connected);
                    log_feed!(Level::INFO, exchange, "Connected");

                    let stop = self.read_loop(&mut shutdown).await;

                    self.transport.close().await;
                    self.set_state(ConnectionState::Disconnected);
                    if stop {
                        break;
                    }
                    self.metrics.record_reconnect();
                }
                Err(e) => {
                    log_feed!(Level::WARN, exchange, error = %e, "Connect failed");
                    self.set_state(ConnectionState::Disconnected);
                }
            }

            failures += 1;
            if let Some(max) = self.policy.max_retries {
                if failures > max {
                    log_feed!(Level::ERROR, exchange, attempts = max, "Giving up on feed");
                    return Err(ArbError::RetriesExhausted { attempts: max });
                }
            }

            log_feed!(
                Level::INFO,
                exchange,
                delay_ms = self.policy.delay.as_millis() as u64,
                "Reconnecting"
            );
            tokio::select! {
                _ = tokio::time::sleep(self.policy.delay) => {}
                _ = shutdown_requested(&mut shutdown) => break,
            }
        }

        self.set_state(ConnectionState::Disconnected);
        log_feed!(Level::INFO, exchange, "Feed stopped");
        Ok(())
    }

    /// Read until the connection drops (`false`) or shutdown (`true`)
    async fn read_loop(&mut self, shutdown: &mut watch::Receiver<bool>) -> bool {
        loop {
            tokio::select! {
                msg = self.transport.next_message() => match msg {
                    Ok(Some(FeedMessage::Text(text))) => {
                        self.handle_message(&text);
                    }
                    Ok(Some(FeedMessage::Heartbeat)) => {}
                    Ok(Some(FeedMessage::Malformed(reason))) => {
                        self.metrics.record_message();
                        self.metrics.record_decode_error();
                        log_feed!(Level::DEBUG, %reason, "Dropping malformed frame");
                    }
                    Ok(None) => {
                        log_feed!(Level::WARN, "Feed closed by peer");
                        return false;
                    }
                    Err(e) => {
                        log_feed!(Level::WARN, error = %e, "Feed read failed");
                        return false;
                    }
                },
                _ = shutdown_requested(shutdown) => return true,
            }
        }
    }

    /// Move to `next`, emitting a status event on a connectivity edge
    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);

        let event = match (prev, next) {
            (ConnectionState::Connected, ConnectionState::Connected) => None,
            (_, ConnectionState::Connected) => Some(FeedStatus::Connected),
            (ConnectionState::Connected, _) => Some(FeedStatus::Disconnected),
            _ => None,
        };

        if let Some(event) = event {
            self.metrics.set_connected(event.is_connected());
            // No subscribers is fine
            let _ = self.status.send(event);
        }
    }
}

/// Resolve once shutdown is signalled
///
/// A dropped sender can never signal, so it pends forever.
pub(crate) async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
