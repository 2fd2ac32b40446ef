//! WebSocket client for real-time market data

pub mod connection;

pub use connection::{ConnectionState, WebSocketConnection, WebSocketError, CONNECT_TIMEOUT};
