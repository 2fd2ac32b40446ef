//! Binance spot ticker feed
//!
//! Connects to the public all-market ticker stream (`!ticker@arr`), which
//! pushes an array of 24hr tickers roughly once per second. No
//! subscription message is needed: the stream is selected by URL.

use crate::exchanges::traits::{FeedMessage, FeedTransport};
use crate::exchanges::Exchange;
use crate::ws::connection::{WebSocketConnection, CONNECT_TIMEOUT};
use crate::{ArbError, Result};

use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::Message;

/// Binance websocket transport
pub struct BinanceTickerFeed {
    url: String,
    connect_timeout: Duration,
    /// A connection with no frames for this long is treated as dropped
    stale_after: Duration,
    connection: Option<WebSocketConnection>,
}

impl BinanceTickerFeed {
    /// Binance spot all-market ticker stream
    pub const WS_URL: &'static str = "wss://stream.binance.com:9443/ws/!ticker@arr";

    /// Default stale-connection timeout
    pub const STALE_AFTER: Duration = Duration::from_secs(30);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: CONNECT_TIMEOUT,
            stale_after: Self::STALE_AFTER,
            connection: None,
        }
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, stale_after: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.stale_after = stale_after;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for BinanceTickerFeed {
    fn default() -> Self {
        Self::new(Self::WS_URL)
    }
}

impl FeedTransport for BinanceTickerFeed {
    #[inline]
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    async fn connect(&mut self) -> Result<()> {
        let conn = WebSocketConnection::connect(&self.url, self.connect_timeout)
            .await
            .map_err(|e| ArbError::WebSocket(e.to_string()))?;
        self.connection = Some(conn);
        Ok(())
    }

    async fn next_message(&mut self) -> Result<Option<FeedMessage>> {
        let Some(conn) = self.connection.as_mut() else {
            return Ok(None);
        };

        let frame = match timeout(self.stale_after, conn.recv()).await {
            Ok(frame) => frame,
            Err(_) => {
                self.connection = None;
                return Err(ArbError::WebSocket(format!(
                    "no data for {}s",
                    self.stale_after.as_secs()
                )));
            }
        };

        match frame {
            Ok(Some(Message::Text(text))) => Ok(Some(FeedMessage::Text(text.to_string()))),
            Ok(Some(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                Ok(text) => Ok(Some(FeedMessage::Text(text))),
                Err(e) => Ok(Some(FeedMessage::Malformed(e.to_string()))),
            },
            Ok(Some(_)) => Ok(Some(FeedMessage::Heartbeat)),
            Ok(None) => {
                self.connection = None;
                Ok(None)
            }
            Err(e) => {
                self.connection = None;
                Err(ArbError::WebSocket(e.to_string()))
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            conn.close().await;
        }
    }

    #[inline]
    fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .map(|c| c.is_connected())
            .unwrap_or(false)
    }
}
