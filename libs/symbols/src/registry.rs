//! Shared hash-to-canonical symbol table.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::warn;

use crate::hash_symbol;

/// Resolution failure at a presentation boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    /// No mapping has been received for this hash yet.
    #[error("unknown symbol hash {hash:#018x}")]
    Unknown { hash: u64 },
}

/// Concurrent mapping from symbol hash to canonical `"venue:symbol"` string.
///
/// Mappings are immutable once inserted: a hash is a pure function of its
/// canonical string, so the first insert wins and later inserts for the same
/// hash are no-ops. Share the registry by cloning an `Arc<SymbolRegistry>`.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    symbols: DashMap<u64, Arc<str>>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self {
            symbols: DashMap::new(),
        }
    }

    /// Register a canonical string and return its hash.
    ///
    /// Producer-side entry point: the returned hash is what goes on the wire,
    /// alongside a `SymbolMapping` TLV announcing the pair to consumers.
    pub fn intern(&self, canonical: &str) -> u64 {
        let hash = hash_symbol(canonical);
        self.symbols
            .entry(hash)
            .or_insert_with(|| Arc::from(canonical));
        hash
    }

    /// Apply a mapping received off the wire.
    ///
    /// The wire hash is authoritative for routing, so it is stored even when
    /// it disagrees with a locally recomputed hash; the disagreement is
    /// logged because it means some producer hashes differently.
    pub fn insert_mapping(&self, hash: u64, canonical: &str) {
        let recomputed = hash_symbol(canonical);
        if recomputed != hash {
            warn!(
                hash = format_args!("{hash:#018x}"),
                recomputed = format_args!("{recomputed:#018x}"),
                canonical, "symbol mapping hash disagrees with local recomputation"
            );
        }
        self.symbols
            .entry(hash)
            .or_insert_with(|| Arc::from(canonical));
    }

    /// Non-blocking lookup. `None` means the mapping has not arrived yet.
    pub fn resolve(&self, hash: u64) -> Option<Arc<str>> {
        self.symbols.get(&hash).map(|entry| Arc::clone(entry.value()))
    }

    /// Lookup that treats a missing mapping as an error.
    pub fn resolve_required(&self, hash: u64) -> Result<Arc<str>, SymbolError> {
        self.resolve(hash).ok_or(SymbolError::Unknown { hash })
    }

    pub fn contains(&self, hash: u64) -> bool {
        self.symbols.contains_key(&hash)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_then_resolve() {
        let registry = SymbolRegistry::new();
        let hash = registry.intern("kraken:ETH-USD");

        let canonical = registry.resolve(hash).unwrap();
        assert_eq!(&*canonical, "kraken:ETH-USD");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_intern_is_idempotent() {
        let registry = SymbolRegistry::new();
        let first = registry.intern("coinbase:BTC-USD");
        let second = registry.intern("coinbase:BTC-USD");

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_resolve_unknown_hash() {
        let registry = SymbolRegistry::new();
        assert_eq!(registry.resolve(0xDEAD_BEEF), None);
        assert_eq!(
            registry.resolve_required(0xDEAD_BEEF),
            Err(SymbolError::Unknown { hash: 0xDEAD_BEEF })
        );
    }

    #[test]
    fn test_wire_mapping_round_trip() {
        let producer = SymbolRegistry::new();
        let consumer = SymbolRegistry::new();

        let hash = producer.intern("kraken:BTC-USD");

        // Consumer applies the mapping exactly as received.
        consumer.insert_mapping(hash, "kraken:BTC-USD");
        assert_eq!(&*consumer.resolve(hash).unwrap(), "kraken:BTC-USD");
    }

    #[test]
    fn test_mismatched_wire_hash_still_resolves() {
        let registry = SymbolRegistry::new();

        // A producer with a divergent hash function still gets its events
        // resolved under the hash it actually sends.
        registry.insert_mapping(42, "bogus:PAIR");
        assert_eq!(&*registry.resolve(42).unwrap(), "bogus:PAIR");
    }

    #[test]
    fn test_shared_across_threads() {
        let registry = std::sync::Arc::new(SymbolRegistry::new());
        let hash = hash_symbol("binance:SOL-USD");

        let writer = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.intern("binance:SOL-USD"))
        };
        assert_eq!(writer.join().unwrap(), hash);
        assert!(registry.contains(hash));
    }
}
