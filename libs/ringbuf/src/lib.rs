//! # Ringbuf: Shared-Memory Trade Ring Buffer
//!
//! ## Purpose
//!
//! Same-host consumers that cannot afford socket hops read trades straight
//! out of a memory-mapped ring file. One writer appends fixed 128-byte
//! records; any number of readers copy records out lock-free using a seqlock
//! over the ring's write sequence. Capacity is fixed at creation and the
//! oldest record is silently overwritten once the ring laps, so the ring is
//! a recency window, not a durable log.
//!
//! ## Protocol
//!
//! The file starts with a 64-byte [`RingHeader`] followed by `capacity`
//! slots. The writer fills the slot at `write_sequence % capacity`
//! completely, fences, and only then publishes the new `write_sequence`.
//! Readers copy the slot, fence, and re-check `write_sequence`: if the
//! writer lapped into the slot mid-copy the read is retried a bounded number
//! of times and then refused. Records more than one lap old are refused as
//! stale without touching slot memory.
//!
//! ## Integration
//!
//! The writer side sits in a collector or relay consumer; reader sides sit
//! in strategy and persistence processes. [`RingReader::open_with_retry`]
//! tolerates the reader process starting before the writer has created the
//! file.

pub mod error;
pub mod layout;
pub mod reader;
pub mod writer;

pub use error::RingError;
pub use layout::{RingHeader, TradeRecord, FORMAT_VERSION, MAX_CAPACITY};
pub use reader::RingReader;
pub use writer::RingWriter;
