//! # Signal Relay Logic
//!
//! Channel identity for the trading signal relay (TLV types 20-39). Lower
//! volume than market data, and the channel defaults disconnect lagging
//! consumers instead of silently skipping past signals.

use relay_core::RelayLogic;
use types::Domain;

/// Signal channel logic. Forwards exactly [`Domain::Signal`] envelopes.
pub struct SignalLogic;

impl RelayLogic for SignalLogic {
    fn domain(&self) -> Domain {
        Domain::Signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Domain, EnvelopeHeader, Source, MESSAGE_MAGIC};

    fn header_with_domain(domain: Domain) -> EnvelopeHeader {
        EnvelopeHeader {
            magic: MESSAGE_MAGIC,
            domain: domain as u8,
            source: Source::ArbStrategy as u8,
            reserved: 0,
            sequence: 1,
            timestamp_ns: 0,
            payload_size: 0,
            checksum: 0,
        }
    }

    #[test]
    fn test_domain_identity() {
        assert_eq!(SignalLogic.domain(), Domain::Signal);
    }

    #[test]
    fn test_forwards_signals_only() {
        let logic = SignalLogic;
        assert!(logic.should_forward(&header_with_domain(Domain::Signal)));
        assert!(!logic.should_forward(&header_with_domain(Domain::MarketData)));
        assert!(!logic.should_forward(&header_with_domain(Domain::Control)));
    }
}
