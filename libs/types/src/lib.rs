//! # Tickbus Protocol Types
//!
//! ## Purpose
//!
//! Single source of truth for the wire format shared by every Tickbus
//! process: the 32-byte envelope header, the TLV payload records carried
//! inside it, and the routing identifiers (domain, source) the relays key
//! on. These layouts cross process boundaries, so they MUST remain stable;
//! any incompatible change requires bumping [`WIRE_REVISION`], which changes
//! [`MESSAGE_MAGIC`] and makes old parsers reject new traffic as framing
//! garbage instead of misreading it.
//!
//! ## Integration Points
//!
//! - **codec**: builds and parses envelopes out of these structs
//! - **relay-core**: routes on [`Domain`] and validates headers
//! - **book**: consumes [`BookSnapshotHeader`]/[`BookDeltaTlv`] payloads
//! - **ringbuf**: shares [`current_timestamp_ns`] and the side encoding
//!
//! ## Architecture Role
//!
//! ```text
//! Producers → [types] → codec → relay sockets → codec → [types] → Consumers
//! ```
//!
//! All structs are `#[repr(C)]` zerocopy types with no padding, so encoding
//! is a byte copy and decoding is a bounds-checked cast.

pub mod control;
pub mod domain;
pub mod envelope;
pub mod market;
pub mod signal;
pub mod tlv;

pub use control::{BookResetTlv, HeartbeatTlv};
pub use domain::{Domain, Source};
pub use envelope::{current_timestamp_ns, EnvelopeHeader};
pub use market::{
    BookDeltaTlv, BookLevel, BookSide, BookSnapshotHeader, DeltaAction, PoolSwapTlv, TradeSide,
    TradeTlv,
};
pub use signal::ArbSignalTlv;
pub use tlv::{TlvHeader, TlvType};

use thiserror::Error;

/// Wire-format revision carried in the low byte of [`MESSAGE_MAGIC`].
///
/// Bumping this is the versioning mechanism for the envelope: there is
/// exactly one accepted header layout per revision, and a revision bump
/// changes the magic so the two never coexist on one channel.
pub const WIRE_REVISION: u8 = 1;

/// Protocol magic number, first 4 bytes of every envelope header.
pub const MESSAGE_MAGIC: u32 = 0xFEED_0000 | WIRE_REVISION as u32;

/// Maximum payload bytes per envelope (64KB).
///
/// A header whose `payload_size` exceeds this is treated as framing garbage,
/// not as a message to wait for; prevents unbounded buffering on corrupt
/// streams.
pub const MAX_PAYLOAD_SIZE: usize = 65_536;

/// Maximum total envelope size (header + payload).
pub const MAX_MESSAGE_SIZE: usize = EnvelopeHeader::SIZE + MAX_PAYLOAD_SIZE;

/// Base directory for Tickbus Unix sockets.
pub const SOCKET_DIR: &str = "/tmp/tickbus";

/// Market-data channel socket (trades, book snapshots/deltas, pool swaps).
pub const MARKET_DATA_SOCKET: &str = "/tmp/tickbus/market_data.sock";

/// Signal channel socket (derived trading signals).
pub const SIGNAL_SOCKET: &str = "/tmp/tickbus/signal.sock";

/// Directory for per-venue raw ingestion sockets (`<venue>.sock` inside).
pub const INGEST_SOCKET_DIR: &str = "/tmp/tickbus/ingest";

/// Protocol-level validation failures.
///
/// These cover structural problems with a single envelope; stream-level
/// framing and checksum handling live in the codec crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("invalid magic: expected {expected:#010x}, got {got:#010x}")]
    InvalidMagic { expected: u32, got: u32 },

    #[error("unknown domain: {0}")]
    UnknownDomain(u8),

    #[error("unknown TLV type: {0}")]
    UnknownTlvType(u16),

    #[error("payload size {size} exceeds limit {max}")]
    PayloadTooLarge { size: u32, max: u32 },
}
