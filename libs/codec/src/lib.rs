//! # Tickbus Envelope Codec
//!
//! ## Purpose
//!
//! Builds and parses the binary envelopes that carry every Tickbus event:
//! a fixed 32-byte header followed by a TLV payload. Parsing is zero-copy
//! where alignment allows and copy-based where it does not (TLV values sit
//! at 4-byte offsets, so fixed records are read by copy, never by cast).
//!
//! ## Integration Points
//!
//! - **Producers**: [`EnvelopeBuilder`] assembles TLVs and finalizes the
//!   header (payload size + CRC32)
//! - **Relay Broker**: [`FrameDecoder`] turns a raw socket byte stream into
//!   whole envelopes, resynchronizing through garbage
//! - **Consumers**: [`decode`] + [`TlvIter`] walk a received envelope
//!
//! ## Architecture Role
//!
//! ```text
//! Producer structs → [builder] → bytes → socket → [frame] → [parser] → structs
//! ```
//!
//! The codec never blocks and never owns a connection; completeness
//! judgement and resynchronization are pure functions of the accumulated
//! buffer, which is what makes them testable without sockets.

pub mod builder;
pub mod error;
pub mod frame;
pub mod parser;

pub use builder::{encode_envelope, encode_book_snapshot, encode_symbol_mapping, EnvelopeBuilder};
pub use error::{CodecError, CodecResult};
pub use frame::{DecoderState, Frame, FrameDecoder};
pub use parser::{
    decode, decode_header, extract_tlv, find_tlv, parse_book_snapshot, parse_symbol_mapping,
    Envelope, RawTlv, TlvIter,
};
