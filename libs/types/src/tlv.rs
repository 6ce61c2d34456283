//! # TLV Type Registry
//!
//! Domain-partitioned registry of payload record types carried inside an
//! envelope (1-19 market data, 20-39 signal, 100-119 control). The envelope
//! itself never changes when a type is added; unknown types inside a valid
//! envelope are skipped by parsers, not treated as errors, so producers can
//! ship new record types ahead of consumers.

use crate::{Domain, MAX_PAYLOAD_SIZE};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// On-wire TLV record header: `type:u16 | length:u16`, then `length` bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
pub struct TlvHeader {
    pub tlv_type: u16,
    pub length: u16,
}

impl TlvHeader {
    /// TLV header size in bytes
    pub const SIZE: usize = 4;
}

/// Registered TLV record types.
///
/// Numeric values are wire-assigned and permanent. Ranges are partitioned by
/// [`Domain`] so a relay can sanity-check that a payload belongs on its
/// channel without understanding the record itself.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum TlvType {
    // Market data domain (1-19)
    /// Single trade execution
    Trade = 1,
    /// Full book snapshot (header + levels)
    BookSnapshot = 2,
    /// Single price-level change
    BookDelta = 3,
    /// DEX pool swap event
    PoolSwap = 4,
    /// Symbol hash → canonical string broadcast
    SymbolMapping = 10,

    // Signal domain (20-39)
    /// Cross-venue arbitrage opportunity
    ArbSignal = 20,

    // Control domain (100-119)
    /// Producer/relay liveness beacon
    Heartbeat = 100,
    /// Administrative order-book reset for one symbol
    BookReset = 101,
}

/// Payload size rule for a TLV type, checked at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlvSizeConstraint {
    /// Payload must be exactly this many bytes
    Fixed(usize),
    /// Payload length must fall within this inclusive range
    Bounded { min: usize, max: usize },
}

impl TlvType {
    /// The domain whose channel this record type belongs on
    pub fn domain(&self) -> Domain {
        match self {
            TlvType::Trade
            | TlvType::BookSnapshot
            | TlvType::BookDelta
            | TlvType::PoolSwap
            | TlvType::SymbolMapping => Domain::MarketData,
            TlvType::ArbSignal => Domain::Signal,
            TlvType::Heartbeat | TlvType::BookReset => Domain::Control,
        }
    }

    /// Size rule for this record type's payload
    pub fn size_constraint(&self) -> TlvSizeConstraint {
        match self {
            TlvType::Trade => TlvSizeConstraint::Fixed(40),
            // Snapshot header plus zero or more 16-byte levels
            TlvType::BookSnapshot => TlvSizeConstraint::Bounded {
                min: 24,
                max: MAX_PAYLOAD_SIZE,
            },
            TlvType::BookDelta => TlvSizeConstraint::Fixed(40),
            TlvType::PoolSwap => TlvSizeConstraint::Fixed(40),
            // Hash plus 1..=256 bytes of canonical UTF-8
            TlvType::SymbolMapping => TlvSizeConstraint::Bounded { min: 9, max: 264 },
            TlvType::ArbSignal => TlvSizeConstraint::Fixed(48),
            TlvType::Heartbeat => TlvSizeConstraint::Fixed(16),
            TlvType::BookReset => TlvSizeConstraint::Fixed(8),
        }
    }

    /// Whether `payload_len` satisfies this type's size rule
    pub fn accepts_len(&self, payload_len: usize) -> bool {
        match self.size_constraint() {
            TlvSizeConstraint::Fixed(expected) => payload_len == expected,
            TlvSizeConstraint::Bounded { min, max } => payload_len >= min && payload_len <= max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tlv_header_size() {
        assert_eq!(std::mem::size_of::<TlvHeader>(), TlvHeader::SIZE);
    }

    #[test]
    fn test_domain_partitioning() {
        assert_eq!(TlvType::Trade.domain(), Domain::MarketData);
        assert_eq!(TlvType::SymbolMapping.domain(), Domain::MarketData);
        assert_eq!(TlvType::ArbSignal.domain(), Domain::Signal);
        assert_eq!(TlvType::Heartbeat.domain(), Domain::Control);
        assert_eq!(TlvType::BookReset.domain(), Domain::Control);
    }

    #[test]
    fn test_unknown_type_is_not_an_enum_value() {
        assert!(TlvType::try_from(19u16).is_err());
        assert!(TlvType::try_from(999u16).is_err());
    }

    #[test]
    fn test_size_rules() {
        assert!(TlvType::Trade.accepts_len(40));
        assert!(!TlvType::Trade.accepts_len(39));
        assert!(TlvType::BookSnapshot.accepts_len(24)); // empty book
        assert!(TlvType::BookSnapshot.accepts_len(24 + 5 * 16));
        assert!(!TlvType::BookSnapshot.accepts_len(10));
        assert!(TlvType::SymbolMapping.accepts_len(9 + 12));
        assert!(!TlvType::SymbolMapping.accepts_len(8)); // empty canonical
    }
}
