//! # Market Data Relay Logic
//!
//! Channel identity for the market data relay (TLV types 1-19: trades,
//! book snapshots and deltas, pool swaps, symbol mappings). This is the
//! highest-volume channel, so it keeps the default domain filter and adds
//! no per-envelope logic of its own.

use relay_core::RelayLogic;
use types::Domain;

/// Market data channel logic. Forwards exactly [`Domain::MarketData`]
/// envelopes; everything else that parses cleanly counts as liveness only.
pub struct MarketDataLogic;

impl RelayLogic for MarketDataLogic {
    fn domain(&self) -> Domain {
        Domain::MarketData
    }
}
