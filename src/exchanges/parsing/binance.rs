//! Binance ticker parser
//!
//! Decodes `!ticker@arr` payloads into `TickerData`. A payload is either an
//! array of ticker objects, a single ticker object, or either of those
//! wrapped in a combined-stream envelope (`{"stream": .., "data": ..}`).
//!
//! Each element is decoded on its own: a malformed element is dropped
//! without affecting its neighbours.

use super::{deserialize_price, DecodeError, DecodedBatch};
use crate::core::TickerData;
use serde::Deserialize;
use serde_json::Value;

/// Binance 24hr ticker fields we consume
///
/// Binance ticker format:
/// {
///   "e": "24hrTicker",
///   "E": 1672515782136,
///   "s": "ETHBTC",
///   "c": "0.0025",     // last price
///   "b": "0.0024",     // best bid
///   "B": "10",
///   "a": "0.0026",     // best ask
///   "A": "100",
///   ...
/// }
#[derive(Debug, Deserialize)]
struct RawTicker {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "c", default, deserialize_with = "deserialize_price")]
    last_price: Option<f64>,
    #[serde(rename = "b", default, deserialize_with = "deserialize_price")]
    best_bid: Option<f64>,
    #[serde(rename = "a", default, deserialize_with = "deserialize_price")]
    best_ask: Option<f64>,
}

impl From<RawTicker> for TickerData {
    fn from(raw: RawTicker) -> Self {
        TickerData::new(raw.symbol, raw.last_price, raw.best_bid, raw.best_ask)
    }
}

/// Binance message parser
pub struct BinanceTickerParser;

impl BinanceTickerParser {
    /// Decode one websocket text payload
    ///
    /// Returns an error only if the payload is not JSON at all; element
    /// level failures are counted in `DecodedBatch::rejected`.
    pub fn parse(text: &str) -> Result<DecodedBatch, DecodeError> {
        let value: Value = serde_json::from_str(text).map_err(|e| DecodeError::Json(e.to_string()))?;

        let body = match value {
            Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
            other => other,
        };

        let mut batch = DecodedBatch::default();
        match body {
            Value::Array(items) => {
                batch.tickers.reserve(items.len());
                for item in items {
                    batch.push(Self::parse_ticker(item));
                }
            }
            Value::Object(_) => {
                if Self::is_control_message(&body) {
                    return Ok(batch);
                }
                batch.push(Self::parse_ticker(body));
            }
            _ => return Err(DecodeError::UnexpectedShape),
        }

        Ok(batch)
    }

    /// Decode a single ticker element
    pub fn parse_ticker(value: Value) -> Option<TickerData> {
        RawTicker::deserialize(value).ok().map(TickerData::from)
    }

    /// Subscription responses (`{"result":null,"id":1}`) carry no data
    fn is_control_message(value: &Value) -> bool {
        value.get("result").is_some() && value.get("id").is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ticker_json;

    #[test]
    fn test_parse_ticker_array() {
        let msg = format!(
            "[{},{}]",
            ticker_json("ETHBTC", "0.0500", "0.0499", "0.0501"),
            ticker_json("BTCUSDT", "30000.0", "29999.5", "30000.5")
        );
        let batch = BinanceTickerParser::parse(&msg).unwrap();

        assert_eq!(batch.tickers.len(), 2);
        assert_eq!(batch.rejected, 0);

        let eth = &batch.tickers[0];
        assert_eq!(eth.symbol, "ETHBTC");
        assert_eq!(eth.last_price, Some(0.05));
        assert_eq!(eth.best_bid, Some(0.0499));
        assert_eq!(eth.best_ask, Some(0.0501));
    }

    #[test]
    fn test_parse_single_object_and_envelope() {
        let single = ticker_json("ETHBTC", "0.05", "0.049", "0.051");
        let batch = BinanceTickerParser::parse(&single).unwrap();
        assert_eq!(batch.tickers.len(), 1);

        let wrapped = format!(r#"{{"stream":"!ticker@arr","data":[{single}]}}"#);
        let batch = BinanceTickerParser::parse(&wrapped).unwrap();
        assert_eq!(batch.tickers.len(), 1);
        assert_eq!(batch.tickers[0].symbol, "ETHBTC");
    }

    #[test]
    fn test_numeric_and_missing_fields() {
        let msg = r#"[{"s":"ETHBTC","c":0.05,"b":0.049},{"s":"SOLBTC"}]"#;
        let batch = BinanceTickerParser::parse(msg).unwrap();

        assert_eq!(batch.tickers.len(), 2);
        assert_eq!(batch.tickers[0].best_bid, Some(0.049));
        assert_eq!(batch.tickers[0].best_ask, None);
        assert_eq!(batch.tickers[1].last_price, None);
    }

    #[test]
    fn test_bad_values_become_absent() {
        let msg = r#"[{"s":"ETHBTC","c":"abc","b":"0","a":"-1"},{"s":"SOLBTC","c":null,"b":"NaN","a":"inf"}]"#;
        let batch = BinanceTickerParser::parse(msg).unwrap();

        assert_eq!(batch.tickers.len(), 2);
        for ticker in &batch.tickers {
            assert_eq!(ticker.last_price, None);
            assert_eq!(ticker.best_bid, None);
            assert_eq!(ticker.best_ask, None);
        }
    }

    #[test]
    fn test_malformed_element_is_isolated() {
        let msg = format!(
            r#"[{{"c":"1.0"}}, 42, {}]"#,
            ticker_json("ETHBTC", "0.05", "0.049", "0.051")
        );
        let batch = BinanceTickerParser::parse(&msg).unwrap();
        assert_eq!(batch.tickers.len(), 1);
        assert_eq!(batch.rejected, 2);
    }

    #[test]
    fn test_subscription_response_is_empty() {
        let batch = BinanceTickerParser::parse(r#"{"result":null,"id":1}"#).unwrap();
        assert!(batch.tickers.is_empty());
        assert_eq!(batch.rejected, 0);
    }

    #[test]
    fn test_invalid_payload() {
        assert!(matches!(
            BinanceTickerParser::parse("not json"),
            Err(DecodeError::Json(_))
        ));
        assert_eq!(
            BinanceTickerParser::parse("42").unwrap_err(),
            DecodeError::UnexpectedShape
        );
    }
}
