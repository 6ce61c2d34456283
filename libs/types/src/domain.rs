//! Routing identifiers carried in the envelope header

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Event domains for channel routing.
///
/// Each domain maps to one relay channel (one Unix socket). A relay forwards
/// only envelopes whose header domain matches its own, so producers cannot
/// leak execution-style traffic into a market-data channel by accident.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum Domain {
    /// Market data (TLV types 1-19): trades, book snapshots/deltas, swaps
    MarketData = 1,

    /// Derived trading signals (TLV types 20-39)
    Signal = 2,

    /// Infrastructure traffic (TLV types 100-119): heartbeats, book resets
    Control = 3,
}

/// Well-known producer identities.
///
/// The header's `source` byte identifies the producer instance of a
/// `(domain, source)` sequence stream. These are the assigned values for
/// first-party services; the relays treat the byte as opaque instance data
/// and never require it to be one of these, so venue collectors deployed
/// later do not need a protocol change.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum Source {
    // Venue collectors (1-19)
    KrakenCollector = 1,
    CoinbaseCollector = 2,
    BinanceCollector = 3,
    PolygonCollector = 4,

    // Strategy services (20-39)
    ArbStrategy = 20,

    // Infrastructure consumers (40-59)
    GatewayBridge = 40,
    PersistenceWriter = 41,

    // Fabric itself (60-79)
    Relay = 60,
}
