//! Market-data payload records (TLV types 1-19)
//!
//! Prices and volumes travel as IEEE f64, matching what venue feeds deliver;
//! consumers that need exact ordering (the order-book reconstructor) convert
//! to fixed-point ticks at their boundary. All symbols travel as 64-bit
//! hashes; the canonical strings move separately via [`TlvType::SymbolMapping`]
//! broadcasts.
//!
//! [`TlvType::SymbolMapping`]: crate::TlvType::SymbolMapping

use num_enum::{IntoPrimitive, TryFromPrimitive};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Aggressor side of a trade
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum TradeSide {
    Buy = 0,
    Sell = 1,
}

/// What a book delta does to its price level
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum DeltaAction {
    /// Replace the size at this price (size 0 also removes the level)
    Set = 1,
    /// Remove the level regardless of size
    Delete = 2,
}

/// Which side of the book a level belongs to
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum BookSide {
    Bid = 0,
    Ask = 1,
}

/// Trade execution record (TLV type 1, 40 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
pub struct TradeTlv {
    pub symbol_hash: u64,
    pub price: f64,
    pub volume: f64,
    /// Venue-reported execution time (the envelope timestamp is emission time)
    pub timestamp_ns: u64,
    pub side: u8,
    pub reserved: [u8; 7],
}

impl TradeTlv {
    pub fn new(symbol_hash: u64, price: f64, volume: f64, timestamp_ns: u64, side: TradeSide) -> Self {
        Self {
            symbol_hash,
            price,
            volume,
            timestamp_ns,
            side: side.into(),
            reserved: [0; 7],
        }
    }

    pub fn side(&self) -> Result<TradeSide, u8> {
        TradeSide::try_from(self.side).map_err(|_| self.side)
    }
}

/// Book snapshot prefix (TLV type 2, 24 bytes + levels)
///
/// Followed on the wire by `bid_count + ask_count` [`BookLevel`] records,
/// bids first. Bids arrive best-first (descending price), asks best-first
/// (ascending price); the reconstructor does not rely on that ordering.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
pub struct BookSnapshotHeader {
    pub symbol_hash: u64,
    /// Venue book sequence this snapshot reflects
    pub sequence: u64,
    pub bid_count: u16,
    pub ask_count: u16,
    pub reserved: u32,
}

impl BookSnapshotHeader {
    pub const SIZE: usize = 24;

    /// Total payload bytes for a snapshot with this many levels
    pub fn payload_size(bid_count: usize, ask_count: usize) -> usize {
        Self::SIZE + (bid_count + ask_count) * BookLevel::SIZE
    }
}

/// One price level inside a snapshot (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
pub struct BookLevel {
    pub price: f64,
    pub size: f64,
}

impl BookLevel {
    pub const SIZE: usize = 16;

    pub fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }
}

/// Single price-level change (TLV type 3, 40 bytes)
///
/// Exactly one level per record; a venue batch becomes several records
/// inside one envelope payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
pub struct BookDeltaTlv {
    pub symbol_hash: u64,
    /// Venue book sequence after this change
    pub sequence: u64,
    pub price: f64,
    pub size: f64,
    pub side: u8,
    pub action: u8,
    pub reserved: [u8; 6],
}

impl BookDeltaTlv {
    pub fn new(
        symbol_hash: u64,
        sequence: u64,
        price: f64,
        size: f64,
        side: BookSide,
        action: DeltaAction,
    ) -> Self {
        Self {
            symbol_hash,
            sequence,
            price,
            size,
            side: side.into(),
            action: action.into(),
            reserved: [0; 6],
        }
    }

    pub fn side(&self) -> Result<BookSide, u8> {
        BookSide::try_from(self.side).map_err(|_| self.side)
    }

    pub fn action(&self) -> Result<DeltaAction, u8> {
        DeltaAction::try_from(self.action).map_err(|_| self.action)
    }
}

/// DEX pool swap event (TLV type 4, 40 bytes)
///
/// All three identifiers are interned hashes: the pool as
/// "venue:pool_address", tokens as "venue:token_address".
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, AsBytes, FromBytes, FromZeroes)]
pub struct PoolSwapTlv {
    pub pool_hash: u64,
    pub token_in: u64,
    pub token_out: u64,
    pub amount_in: f64,
    pub amount_out: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_sizes() {
        assert_eq!(std::mem::size_of::<TradeTlv>(), 40);
        assert_eq!(std::mem::size_of::<BookSnapshotHeader>(), BookSnapshotHeader::SIZE);
        assert_eq!(std::mem::size_of::<BookLevel>(), BookLevel::SIZE);
        assert_eq!(std::mem::size_of::<BookDeltaTlv>(), 40);
        assert_eq!(std::mem::size_of::<PoolSwapTlv>(), 40);
    }

    #[test]
    fn test_trade_side_encoding() {
        let trade = TradeTlv::new(0xABCD, 100.5, 0.25, 1_700_000_000_000_000_000, TradeSide::Sell);
        assert_eq!(trade.side, 1);
        assert_eq!(trade.side(), Ok(TradeSide::Sell));

        let mut wire = trade;
        wire.side = 7;
        assert_eq!(wire.side(), Err(7));
    }

    #[test]
    fn test_snapshot_payload_size() {
        assert_eq!(BookSnapshotHeader::payload_size(0, 0), 24);
        assert_eq!(BookSnapshotHeader::payload_size(2, 3), 24 + 5 * 16);
    }

    #[test]
    fn test_delta_round_trip_through_bytes() {
        use zerocopy::FromBytes;

        let delta = BookDeltaTlv::new(77, 12, 99.0, 1.5, BookSide::Bid, DeltaAction::Set);
        let parsed = BookDeltaTlv::read_from(delta.as_bytes()).unwrap();
        assert_eq!(parsed, delta);
        assert_eq!(parsed.action(), Ok(DeltaAction::Set));
    }
}
