//! Exchange-specific implementations

pub mod binance;
pub mod parsing;
pub mod stream;
pub mod traits;

pub use binance::BinanceTickerFeed;
pub use parsing::{BinanceTickerParser, DecodeError, DecodedBatch};
pub use stream::{FeedMonitor, FeedStatus, MessageOutcome, ReconnectPolicy, StreamAdapter};
pub use traits::{FeedMessage, FeedTransport};

/// Exchange identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exchange {
    Binance,
}

impl Exchange {
    pub fn name(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
        }
    }
}
