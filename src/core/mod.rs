//! Core types for the currency graph
//!
//! This module contains the fundamental types used throughout the system:
//! - Currency / CurrencySet: the fixed vertex set
//! - PairTable: exchange symbol to (base, quote) resolution
//! - TickerData / Quote: decoded market data

pub mod currency;
pub mod market_data;
pub mod pair_table;

pub use currency::{Currency, CurrencyError, CurrencySet};
pub use market_data::{valid_price, Quote, TickerData};
pub use pair_table::{AmbiguousSymbol, Pair, PairTable};
