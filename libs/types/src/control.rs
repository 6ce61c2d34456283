//! Control-domain payload records (TLV types 100-119)

use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Liveness beacon (TLV type 100, 16 bytes)
///
/// Emitted periodically by producers and by the relay itself so consumers
/// can tell a quiet market from a dead peer. `last_sequence` is the sender's
/// most recent data sequence, letting consumers spot gaps that occurred
/// while they were disconnected.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
pub struct HeartbeatTlv {
    pub timestamp_ns: u64,
    pub last_sequence: u64,
}

/// Administrative order-book reset (TLV type 101, 8 bytes)
///
/// The only way a Live book returns to Uninitialized; normal traffic never
/// resets a book.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
pub struct BookResetTlv {
    pub symbol_hash: u64,
}
