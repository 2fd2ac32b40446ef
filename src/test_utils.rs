//! Test utilities: currency sets, graphs, ticker payloads and a
//! scripted feed transport
//!
//! Tests refer to currencies by symbol; helpers panic on bad input since
//! they only run under `cfg(test)`.

use crate::core::CurrencySet;
use crate::exchanges::{Exchange, FeedMessage, FeedTransport};
use crate::hot_path::rate_graph::DEFAULT_FEE_RATE;
use crate::hot_path::{RateGraph, RateSource};
use crate::{ArbError, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Currency set from symbols
pub fn currencies(symbols: &[&str]) -> CurrencySet {
    CurrencySet::new(symbols.iter().copied()).expect("valid test currency set")
}

/// Empty graph over the given symbols
pub fn graph(symbols: &[&str]) -> RateGraph {
    RateGraph::new(currencies(symbols), DEFAULT_FEE_RATE)
}

/// Graph with `(from, to, rate)` cells set directly
pub fn graph_with_rates(symbols: &[&str], rates: &[(&str, &str, f64)]) -> RateGraph {
    let g = graph(symbols);
    for (from, to, rate) in rates {
        let from = g.currencies().get(from).expect("known from currency");
        let to = g.currencies().get(to).expect("known to currency");
        assert!(g.set_rate(from, to, *rate), "rate {rate} rejected");
    }
    g
}

/// Binance `!ticker@arr` element
pub fn ticker_json(symbol: &str, last: &str, bid: &str, ask: &str) -> String {
    format!(
        r#"{{"e":"24hrTicker","E":1672515782136,"s":"{symbol}","c":"{last}","b":"{bid}","B":"1.0","a":"{ask}","A":"1.0"}}"#
    )
}

/// One scripted read
pub enum Step {
    Text(String),
    /// Graceful close by the peer
    Close,
    /// Transport error
    Fail,
    /// Frame that is not readable text
    Malformed,
}

/// One connect attempt: refused, or accepted with a script to play
pub enum Session {
    Refuse,
    Accept(Vec<Step>),
    /// Connect never completes
    Stall,
}

/// In-memory feed transport
///
/// Each `connect` consumes the next session; once sessions run out every
/// attempt is refused. An accepted session idles after its script ends.
pub struct ScriptedTransport {
    sessions: VecDeque<Session>,
    current: Option<VecDeque<Step>>,
    connects: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    /// Transport plus a counter of connect attempts
    pub fn new(sessions: Vec<Session>) -> (Self, Arc<AtomicUsize>) {
        let connects = Arc::new(AtomicUsize::new(0));
        let transport = Self {
            sessions: sessions.into(),
            current: None,
            connects: connects.clone(),
        };
        (transport, connects)
    }
}

impl FeedTransport for ScriptedTransport {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    async fn connect(&mut self) -> Result<()> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.sessions.pop_front() {
            Some(Session::Accept(steps)) => {
                self.current = Some(steps.into());
                Ok(())
            }
            Some(Session::Stall) => std::future::pending().await,
            Some(Session::Refuse) | None => Err(ArbError::WebSocket("connection refused".into())),
        }
    }

    async fn next_message(&mut self) -> Result<Option<FeedMessage>> {
        let step = self.current.as_mut().and_then(|s| s.pop_front());
        match step {
            Some(Step::Text(text)) => Ok(Some(FeedMessage::Text(text))),
            Some(Step::Malformed) => Ok(Some(FeedMessage::Malformed("invalid utf-8".into()))),
            Some(Step::Close) => {
                self.current = None;
                Ok(None)
            }
            Some(Step::Fail) => {
                self.current = None;
                Err(ArbError::WebSocket("reset by peer".into()))
            }
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        self.current = None;
    }

    fn is_connected(&self) -> bool {
        self.current.is_some()
    }
}
