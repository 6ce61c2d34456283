//! Envelope Header Implementation
//!
//! The header is identical for all messages and carries routing, ordering,
//! and integrity information for the TLV payload that follows it.

use crate::{Domain, ProtocolError, Source, MAX_PAYLOAD_SIZE, MESSAGE_MAGIC};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

/// Envelope header (32 bytes, little-endian)
///
/// **CRITICAL**: Field ordering is designed to reach exactly 32 bytes with
/// zero padding. Fields are grouped so every member sits at its natural
/// alignment. DO NOT REORDER without re-checking the layout test.
///
/// ```text
/// ┌─────────────────┬─────────────────────────────────────┐
/// │ EnvelopeHeader  │ TLV payload                         │
/// │ (32 bytes)      │ (payload_size bytes)                │
/// └─────────────────┴─────────────────────────────────────┘
/// ```
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsBytes, FromBytes, FromZeroes)]
pub struct EnvelopeHeader {
    /// Protocol identification, MUST be first (bytes 0-3)
    pub magic: u32,

    /// Routing identity (bytes 4-5)
    pub domain: u8,
    pub source: u8,

    /// Zero on the wire; reads ignore it so it can be assigned later (bytes 6-7)
    pub reserved: u16,

    /// Monotonic per `(domain, source)` stream (bytes 8-15)
    pub sequence: u64,

    /// Producer-assigned emission time, nanoseconds since epoch (bytes 16-23)
    pub timestamp_ns: u64,

    /// Payload length in bytes (bytes 24-27)
    pub payload_size: u32,

    /// CRC32 over the payload bytes only (bytes 28-31)
    pub checksum: u32,
}

impl EnvelopeHeader {
    /// Header size in bytes
    pub const SIZE: usize = 32;

    /// Create a header for a fresh envelope, timestamped now.
    ///
    /// `sequence`, `payload_size`, and `checksum` start at zero and are
    /// filled in when the envelope is finalized.
    pub fn new(domain: Domain, source: Source) -> Self {
        Self {
            magic: MESSAGE_MAGIC,
            domain: domain.into(),
            source: source.into(),
            reserved: 0,
            sequence: 0,
            timestamp_ns: current_timestamp_ns(),
            payload_size: 0,
            checksum: 0,
        }
    }

    /// Validate the header format.
    ///
    /// Checks magic, domain, and the payload-size bound. The `source` byte is
    /// deliberately not range-checked: it identifies a producer instance and
    /// new instances must not require a protocol release.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.magic != MESSAGE_MAGIC {
            return Err(ProtocolError::InvalidMagic {
                expected: MESSAGE_MAGIC,
                got: self.magic,
            });
        }

        Domain::try_from(self.domain).map_err(|_| ProtocolError::UnknownDomain(self.domain))?;

        if self.payload_size as usize > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload_size,
                max: MAX_PAYLOAD_SIZE as u32,
            });
        }

        Ok(())
    }

    /// Get the routing domain for this envelope
    pub fn domain(&self) -> Result<Domain, ProtocolError> {
        Domain::try_from(self.domain).map_err(|_| ProtocolError::UnknownDomain(self.domain))
    }

    /// Set the per-stream sequence number
    pub fn set_sequence(&mut self, seq: u64) {
        self.sequence = seq;
    }

    /// Calculate and store the checksum for the given payload bytes
    pub fn finalize_payload(&mut self, payload: &[u8]) {
        self.payload_size = payload.len() as u32;
        self.checksum = payload_checksum(payload);
    }

    /// Verify the stored checksum against received payload bytes
    pub fn verify_checksum(&self, payload: &[u8]) -> bool {
        payload_checksum(payload) == self.checksum
    }

    /// Age of this envelope relative to the local clock, in nanoseconds
    pub fn age_ns(&self) -> u64 {
        current_timestamp_ns().saturating_sub(self.timestamp_ns)
    }
}

/// CRC32 over payload bytes.
///
/// The header is excluded on purpose: header corruption is caught by the
/// magic/domain checks and by resynchronization, while the checksum answers
/// only "did the payload survive the transport".
pub fn payload_checksum(payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Current timestamp in nanoseconds since the Unix epoch
pub fn current_timestamp_ns() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("System time before Unix epoch")
        .as_nanos() as u64
}
