//! On-disk layout of the ring file: header plus fixed-width trade slots.

use std::sync::atomic::AtomicU64;

use types::TradeSide;
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Layout revision stamped into every ring file header.
pub const FORMAT_VERSION: u32 = 1;

/// Upper bound on slot count, keeping the largest ring at 128 MiB.
pub const MAX_CAPACITY: u32 = 1 << 20;

/// First 64 bytes of the ring file.
///
/// `write_sequence` is the only field that changes after creation: it counts
/// records ever written, so `write_sequence % capacity` is the next slot and
/// `write_sequence - capacity` is the oldest sequence still intact.
#[repr(C)]
pub struct RingHeader {
    pub format_version: u32,
    pub capacity: u32,
    pub write_sequence: AtomicU64,
    pub reserved: [u8; 48],
}

impl RingHeader {
    pub const SIZE: usize = 64;
}

/// One ring slot: a trade flattened to a fixed 128 bytes.
///
/// Symbol and venue travel as NUL-padded fixed-width text rather than
/// hashes: ring consumers are often simple pollers with no registry wired
/// in, and 128 bytes leaves room regardless.
#[repr(C)]
#[derive(Debug, Clone, Copy, AsBytes, FromBytes, FromZeroes)]
pub struct TradeRecord {
    pub timestamp_ns: u64,
    pub symbol: [u8; 16],
    pub venue: [u8; 16],
    pub price: f64,
    pub volume: f64,
    pub side: u8,
    pub reserved: [u8; 71],
}

impl TradeRecord {
    pub const SIZE: usize = 128;

    pub fn new(
        timestamp_ns: u64,
        symbol: &str,
        venue: &str,
        price: f64,
        volume: f64,
        side: TradeSide,
    ) -> Self {
        let mut record = Self {
            timestamp_ns,
            symbol: [0; 16],
            venue: [0; 16],
            price,
            volume,
            side: side as u8,
            reserved: [0; 71],
        };
        copy_truncated(&mut record.symbol, symbol);
        copy_truncated(&mut record.venue, venue);
        record
    }

    pub fn symbol_str(&self) -> String {
        fixed_text(&self.symbol)
    }

    pub fn venue_str(&self) -> String {
        fixed_text(&self.venue)
    }

    pub fn side(&self) -> Result<TradeSide, u8> {
        TradeSide::try_from(self.side).map_err(|_| self.side)
    }
}

fn copy_truncated(dest: &mut [u8], text: &str) {
    let n = text.len().min(dest.len());
    dest[..n].copy_from_slice(&text.as_bytes()[..n]);
}

fn fixed_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<RingHeader>(), RingHeader::SIZE);
        assert_eq!(std::mem::size_of::<TradeRecord>(), TradeRecord::SIZE);
    }

    #[test]
    fn test_record_field_positions() {
        let record = TradeRecord::new(
            7_000_000_001,
            "BTC-USD",
            "kraken",
            65_000.25,
            0.5,
            TradeSide::Sell,
        );
        let bytes = record.as_bytes();

        assert_eq!(&bytes[0..8], &7_000_000_001u64.to_le_bytes());
        assert_eq!(&bytes[8..15], b"BTC-USD");
        assert_eq!(&bytes[24..30], b"kraken");
        assert_eq!(&bytes[40..48], &65_000.25f64.to_le_bytes());
        assert_eq!(&bytes[48..56], &0.5f64.to_le_bytes());
        assert_eq!(bytes[56], TradeSide::Sell as u8);
    }

    #[test]
    fn test_text_helpers_round_trip() {
        let record = TradeRecord::new(1, "ETH-USD", "coinbase", 1.0, 2.0, TradeSide::Buy);
        assert_eq!(record.symbol_str(), "ETH-USD");
        assert_eq!(record.venue_str(), "coinbase");
        assert_eq!(record.side(), Ok(TradeSide::Buy));
    }

    #[test]
    fn test_overlong_text_truncates() {
        let record = TradeRecord::new(
            1,
            "A-VERY-LONG-SYMBOL-NAME",
            "an-equally-long-venue",
            1.0,
            2.0,
            TradeSide::Buy,
        );
        assert_eq!(record.symbol_str(), "A-VERY-LONG-SYMB");
        assert_eq!(record.venue_str(), "an-equally-long-");
    }
}
