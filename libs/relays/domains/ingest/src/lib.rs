//! # Ingest Relay Logic
//!
//! Channel identity for a per-venue ingest relay. One instance runs per
//! venue and serves `/tmp/tickbus/ingest/<venue>.sock`, giving a venue
//! collector a private fan-in point before normalized data reaches the
//! shared market data channel. Only market data envelopes are forwarded;
//! the venue name is instance data, not a compile-time constant.

use relay_core::RelayLogic;
use types::Domain;

/// Ingest channel logic for one venue.
pub struct IngestLogic {
    venue: String,
}

impl IngestLogic {
    pub fn new(venue: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
        }
    }

    pub fn venue(&self) -> &str {
        &self.venue
    }
}

impl RelayLogic for IngestLogic {
    fn domain(&self) -> Domain {
        Domain::MarketData
    }
}
