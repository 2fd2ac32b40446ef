//! Market data types
//!
//! `TickerData` is one decoded ticker record as it arrives from the feed.
//! `Quote` is the same record after its symbol has been resolved to a pair
//! and its prices reduced to the two sides the rate graph consumes.

use super::{Pair, PairTable};

/// Returns the price only if it is finite and strictly positive
#[inline(always)]
pub fn valid_price(price: f64) -> Option<f64> {
    (price.is_finite() && price > 0.0).then_some(price)
}

/// Ticker record from the price feed
///
/// Every price field is optional: missing, non-numeric, zero, negative and
/// non-finite values are all decoded as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerData {
    /// Exchange pair symbol (e.g. `ETHBTC`)
    pub symbol: String,
    /// Last traded price
    pub last_price: Option<f64>,
    /// Best bid price
    pub best_bid: Option<f64>,
    /// Best ask price
    pub best_ask: Option<f64>,
}

impl TickerData {
    pub fn new(
        symbol: impl Into<String>,
        last_price: Option<f64>,
        best_bid: Option<f64>,
        best_ask: Option<f64>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            last_price: last_price.and_then(valid_price),
            best_bid: best_bid.and_then(valid_price),
            best_ask: best_ask.and_then(valid_price),
        }
    }

    /// Price paid to buy the base: best ask, else last price
    #[inline]
    pub fn buy_price(&self) -> Option<f64> {
        self.best_ask.or(self.last_price)
    }

    /// Price received selling the base: best bid, else last price
    #[inline]
    pub fn sell_price(&self) -> Option<f64> {
        self.best_bid.or(self.last_price)
    }

    /// Resolve against the pair table
    ///
    /// Returns `None` for unknown symbols and for tickers with no usable
    /// price on either side.
    pub fn to_quote(&self, pairs: &PairTable) -> Option<Quote> {
        let pair = pairs.resolve(&self.symbol)?;
        let bid = self.sell_price();
        let ask = self.buy_price();
        if bid.is_none() && ask.is_none() {
            return None;
        }
        Some(Quote { pair, bid, ask })
    }
}

/// Resolved quote ready for the rate graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub pair: Pair,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
}
