//! Codec error taxonomy
//!
//! The split matters operationally: `Incomplete` means wait for more bytes,
//! `Framing` means the stream is misaligned and the caller should slip
//! forward byte by byte, `ChecksumMismatch` means drop exactly one
//! well-framed envelope. None of them justify closing a connection.

use thiserror::Error;
use types::{ProtocolError, TlvType};

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CodecError {
    /// Not enough bytes accumulated yet; `need` is the total frame length
    /// once known, or the header size while it is not.
    #[error("incomplete message: need {need} bytes, have {have}")]
    Incomplete { need: usize, have: usize },

    /// Header failed structural validation; resynchronize.
    #[error("framing error: {0}")]
    Framing(#[from] ProtocolError),

    /// Well-framed envelope with corrupt payload; drop it.
    #[error("checksum mismatch: header says {expected:#010x}, payload hashes to {calculated:#010x}")]
    ChecksumMismatch { expected: u32, calculated: u32 },

    /// TLV declares more value bytes than the payload holds.
    #[error("truncated TLV at offset {offset}: declares {declared} bytes, {available} remain")]
    TruncatedTlv {
        offset: usize,
        declared: usize,
        available: usize,
    },

    /// TLV length violates the registered size rule for its type.
    #[error("TLV size mismatch for {tlv_type:?}: {len} bytes")]
    TlvSizeMismatch { tlv_type: TlvType, len: usize },

    /// Typed extraction found no TLV of the requested type.
    #[error("missing TLV {0:?} in payload")]
    MissingTlv(TlvType),

    /// Variable-length record with an internally inconsistent layout.
    #[error("malformed {record} record: {detail}")]
    Malformed {
        record: &'static str,
        detail: &'static str,
    },

    /// Builder refused a payload beyond the protocol bound.
    #[error("payload too large: {size} bytes exceeds {max}")]
    Oversized { size: usize, max: usize },
}
