//! Signal-domain payload records (TLV types 20-39)

use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Cross-venue arbitrage opportunity (TLV type 20, 48 bytes)
///
/// Venue fields are interned hashes of the bare venue name ("kraken",
/// "coinbase"); `expected_profit` is quoted in the symbol's quote currency.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
pub struct ArbSignalTlv {
    pub signal_id: u64,
    pub symbol_hash: u64,
    pub buy_venue: u64,
    pub sell_venue: u64,
    pub expected_profit: f64,
    /// Strategy confidence in [0, 1]
    pub confidence: f64,
}
