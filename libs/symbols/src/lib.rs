//! # Symbols: Interning Registry and Unknown-Symbol Holding Area
//!
//! ## Purpose
//!
//! Market data events carry a fixed-width `u64` symbol hash instead of the
//! canonical `"venue:symbol"` string, keeping wire records fixed-size and
//! comparisons cheap. This crate owns both directions of that scheme: the
//! pure hash function, the registry that maps hashes back to canonical
//! strings, and the bounded holding area for events that arrive before their
//! mapping does.
//!
//! ## Integration
//!
//! The registry is an explicitly shared table: construct one, wrap it in an
//! `Arc`, and hand clones to every component that needs resolution. Nothing
//! in this crate is a process-wide singleton. Producers call [`hash_symbol`]
//! (or [`SymbolRegistry::intern`]) when encoding; consumers feed received
//! `SymbolMapping` TLVs into [`SymbolRegistry::insert_mapping`] and resolve
//! at presentation boundaries only.
//!
//! "Data before mapping" is the normal case on a fresh connection, not an
//! error: park the event in [`PendingSymbolEvents`] and claim it when the
//! mapping shows up. Both the per-hash capacity and the time-to-live are
//! bounded, so a mapping that never arrives costs a counter, not memory.

pub mod pending;
pub mod registry;

pub use pending::{PendingSymbolEvents, DEFAULT_EVENT_TTL, DEFAULT_MAX_EVENTS_PER_HASH};
pub use registry::{SymbolError, SymbolRegistry};

/// Hash a canonical `"venue:symbol"` string to its wire handle.
///
/// xxHash64 with seed 0: stable across processes, architectures, and
/// language bindings, so every participant derives the same handle from the
/// same canonical string without coordination.
#[inline]
pub fn hash_symbol(canonical: &str) -> u64 {
    xxhash_rust::xxh64::xxh64(canonical.as_bytes(), 0)
}
