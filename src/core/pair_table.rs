//! Symbol mapping from exchange pair names to graph edges
//!
//! Exchanges quote pairs as a bare concatenation (`ETHBTC`), so there is no
//! delimiter to split on. The table holds every `base+quote` concatenation
//! over the fixed currency set, built once at startup.

use crate::core::{Currency, CurrencySet};
use std::collections::HashMap;

/// Resolved trading pair: 1 `base` = price `quote`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pair {
    pub base: Currency,
    pub quote: Currency,
}

/// Concatenation that more than one (base, quote) split produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousSymbol {
    pub symbol: String,
    /// Split that wins (first in vertex order)
    pub kept: Pair,
    /// Split that was shadowed
    pub shadowed: Pair,
}

/// O(1) wire symbol → pair lookup
#[derive(Debug, Clone)]
pub struct PairTable {
    pairs: HashMap<String, Pair>,
    ambiguous: Vec<AmbiguousSymbol>,
}

impl PairTable {
    /// Build the table over all ordered pairs of distinct currencies
    ///
    /// Ambiguous concatenations are not resolved: the first match by
    /// vertex-set iteration order (base, then quote) wins.
    pub fn build(currencies: &CurrencySet) -> Self {
        let n = currencies.len();
        let mut pairs = HashMap::with_capacity(n * n);
        let mut ambiguous = Vec::new();

        for base in currencies.iter() {
            for quote in currencies.iter() {
                if base == quote {
                    continue;
                }
                let symbol = format!("{}{}", currencies.name(base), currencies.name(quote));
                let pair = Pair { base, quote };
                match pairs.get(&symbol) {
                    Some(kept) => ambiguous.push(AmbiguousSymbol {
                        symbol,
                        kept: *kept,
                        shadowed: pair,
                    }),
                    None => {
                        pairs.insert(symbol, pair);
                    }
                }
            }
        }

        for entry in &ambiguous {
            tracing::warn!(
                symbol = %entry.symbol,
                kept = %format!("{}/{}", currencies.name(entry.kept.base), currencies.name(entry.kept.quote)),
                shadowed = %format!("{}/{}", currencies.name(entry.shadowed.base), currencies.name(entry.shadowed.quote)),
                "Ambiguous pair symbol, first split wins"
            );
        }

        Self { pairs, ambiguous }
    }

    /// Resolve a wire symbol (e.g. `ETHBTC`); unknown symbols return `None`
    #[inline]
    pub fn resolve(&self, symbol: &str) -> Option<Pair> {
        self.pairs.get(symbol).copied()
    }

    /// Number of resolvable symbols
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Concatenation collisions found at build time
    pub fn ambiguous(&self) -> &[AmbiguousSymbol] {
        &self.ambiguous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_pairs() {
        let set = CurrencySet::new(["BTC", "ETH", "USDT", "USDC"]).unwrap();
        let table = PairTable::build(&set);

        // 4 * 3 ordered pairs
        assert_eq!(table.len(), 12);

        let pair = table.resolve("ETHBTC").unwrap();
        assert_eq!(pair.base, set.get("ETH").unwrap());
        assert_eq!(pair.quote, set.get("BTC").unwrap());

        let pair = table.resolve("USDCUSDT").unwrap();
        assert_eq!(set.name(pair.base), "USDC");
        assert_eq!(set.name(pair.quote), "USDT");
    }

    #[test]
    fn test_unknown_symbol_is_none() {
        let set = CurrencySet::new(["BTC", "ETH", "USDT"]).unwrap();
        let table = PairTable::build(&set);
        assert!(table.resolve("DOGEUSDT").is_none());
        assert!(table.resolve("BTCBTC").is_none());
        assert!(table.resolve("").is_none());
    }

    #[test]
    fn test_ambiguous_first_split_wins() {
        // "AB"+"C" and "A"+"BC" both concatenate to "ABC"
        let set = CurrencySet::new(["AB", "C", "A", "BC"]).unwrap();
        let table = PairTable::build(&set);

        let pair = table.resolve("ABC").unwrap();
        assert_eq!(set.name(pair.base), "AB");
        assert_eq!(set.name(pair.quote), "C");

        assert_eq!(table.ambiguous().len(), 1);
        let entry = &table.ambiguous()[0];
        assert_eq!(entry.symbol, "ABC");
        assert_eq!(set.name(entry.shadowed.base), "A");
        assert_eq!(set.name(entry.shadowed.quote), "BC");
    }
}
