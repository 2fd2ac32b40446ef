//! Price feed transport abstraction
//!
//! The stream adapter owns exactly one transport and drives it through
//! connect / read / close. Production uses the Binance websocket; tests
//! use scripted in-memory transports.

use crate::exchanges::Exchange;
use crate::Result;
use std::future::Future;

/// One raw payload from the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    /// Text payload carrying zero or more ticker records
    Text(String),
    /// Transport-level keepalive, carries no data
    Heartbeat,
    /// Frame that arrived intact but cannot be read as text
    Malformed(String),
}

/// Connection to an external price feed
///
/// # Design Notes
/// - Futures are `Send` so the adapter can run on a spawned task
/// - `next_message()` returns `Ok(None)` when the peer closes gracefully
/// - Errors are transport failures; the adapter reconnects on all of them
/// - A bad frame on a healthy connection is `FeedMessage::Malformed`, not an error
pub trait FeedTransport: Send {
    /// Exchange identifier (for logging/metrics)
    fn exchange(&self) -> Exchange;

    /// Open the connection
    fn connect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Receive the next payload
    fn next_message(&mut self) -> impl Future<Output = Result<Option<FeedMessage>>> + Send;

    /// Close the connection if open
    fn close(&mut self) -> impl Future<Output = ()> + Send;

    /// Check if connection is active
    fn is_connected(&self) -> bool;
}
