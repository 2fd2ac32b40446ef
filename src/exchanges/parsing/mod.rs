//! JSON decoders for exchange ticker messages
//!
//! Decoding is tolerant: numbers may arrive as JSON strings or numbers,
//! and any value that is not a finite positive price decodes as absent.

pub mod binance;

pub use binance::BinanceTickerParser;

use crate::core::{valid_price, TickerData};
use serde::de::{self, Deserializer, Visitor};
use std::fmt;

/// Tickers decoded from one payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedBatch {
    pub tickers: Vec<TickerData>,
    /// Elements that could not be decoded at all
    pub rejected: usize,
}

impl DecodedBatch {
    #[inline]
    fn push(&mut self, ticker: Option<TickerData>) {
        match ticker {
            Some(t) => self.tickers.push(t),
            None => self.rejected += 1,
        }
    }
}

/// Payload-level decode failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("expected a ticker object or array")]
    UnexpectedShape,
}

/// Deserialize a price from a JSON string, number or null
///
/// Never fails: unparseable, non-finite and non-positive values become
/// `None`.
pub fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PriceVisitor;

    impl<'de> Visitor<'de> for PriceVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a price as a string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.trim().parse::<f64>().ok().and_then(valid_price))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(valid_price(value))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(valid_price(value as f64))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(valid_price(value as f64))
        }

        fn visit_bool<E>(self, _value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(PriceVisitor)
}
