//! Currency interning for the fixed vertex set
//!
//! Currencies are stored as u16 indices into a `CurrencySet` established
//! at startup. The set never changes for the lifetime of a graph, so every
//! lookup after construction is a plain array index.

use std::collections::HashMap;
use std::fmt;

/// Index of a currency within its `CurrencySet`
///
/// Only meaningful for the set that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Currency(u16);

impl Currency {
    #[inline(always)]
    pub const fn from_raw(id: u16) -> Self {
        Self(id)
    }

    #[inline(always)]
    pub const fn as_raw(&self) -> u16 {
        self.0
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Errors building a currency set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurrencyError {
    #[error("at least 3 currencies are required, got {0}")]
    TooFew(usize),
    #[error("too many currencies: {0}")]
    TooMany(usize),
    #[error("empty currency symbol at position {0}")]
    Empty(usize),
    #[error("duplicate currency symbol: {0}")]
    Duplicate(String),
}

/// Fixed, ordered set of currencies (graph vertices)
///
/// Iteration order is construction order. The cycle detector enumerates
/// triples in this order, which makes tie-breaking deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencySet {
    names: Vec<String>,
    lookup: HashMap<String, Currency>,
}

impl CurrencySet {
    /// Build a set from symbols, e.g. `["BTC", "ETH", "USDT"]`
    pub fn new<I, S>(symbols: I) -> Result<Self, CurrencyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = Vec::new();
        let mut lookup = HashMap::new();

        for (position, symbol) in symbols.into_iter().enumerate() {
            let symbol = symbol.as_ref().trim().to_ascii_uppercase();
            if symbol.is_empty() {
                return Err(CurrencyError::Empty(position));
            }
            if lookup.contains_key(&symbol) {
                return Err(CurrencyError::Duplicate(symbol));
            }
            if names.len() >= u16::MAX as usize {
                return Err(CurrencyError::TooMany(names.len() + 1));
            }

            let id = Currency(names.len() as u16);
            lookup.insert(symbol.clone(), id);
            names.push(symbol);
        }

        if names.len() < 3 {
            return Err(CurrencyError::TooFew(names.len()));
        }

        Ok(Self { names, lookup })
    }

    /// Number of vertices
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Look up a currency by symbol (exact, upper-case)
    #[inline]
    pub fn get(&self, symbol: &str) -> Option<Currency> {
        self.lookup.get(symbol).copied()
    }

    /// Symbol for a currency, `"UNKNOWN"` if it belongs to another set
    #[inline]
    pub fn name(&self, currency: Currency) -> &str {
        self.names
            .get(currency.index())
            .map(String::as_str)
            .unwrap_or("UNKNOWN")
    }

    /// True if the currency indexes into this set
    #[inline(always)]
    pub fn contains(&self, currency: Currency) -> bool {
        currency.index() < self.names.len()
    }

    /// All currencies in vertex order
    pub fn iter(&self) -> impl Iterator<Item = Currency> + '_ {
        (0..self.names.len()).map(|i| Currency(i as u16))
    }

    /// Symbols in vertex order
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl fmt::Display for CurrencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join(","))
    }
}
