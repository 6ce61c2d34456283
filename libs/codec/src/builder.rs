//! Envelope construction
//!
//! [`EnvelopeBuilder`] is the producer-side entry point: append TLV records,
//! then `build()` finalizes the header (payload size, CRC32 over the payload
//! bytes) and returns the full wire image. Fixed-size records are appended
//! straight from their zerocopy byte view; the two variable-length records
//! (symbol mapping, book snapshot) have dedicated encode helpers.

use crate::error::{CodecError, CodecResult};
use byteorder::{LittleEndian, WriteBytesExt};
use types::{
    current_timestamp_ns, BookLevel, BookSnapshotHeader, Domain, EnvelopeHeader, Source,
    TlvHeader, TlvType, MAX_PAYLOAD_SIZE,
};
use zerocopy::AsBytes;

/// Builder for a single envelope carrying one or more TLV records.
pub struct EnvelopeBuilder {
    header: EnvelopeHeader,
    payload: Vec<u8>,
    oversized: Option<CodecError>,
}

impl EnvelopeBuilder {
    pub fn new(domain: Domain, source: Source) -> Self {
        Self {
            header: EnvelopeHeader::new(domain, source),
            payload: Vec::new(),
            oversized: None,
        }
    }

    /// Set the per-stream sequence number (producers own their counters)
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.header.sequence = sequence;
        self
    }

    /// Override the emission timestamp (defaults to construction time)
    pub fn with_timestamp(mut self, timestamp_ns: u64) -> Self {
        self.header.timestamp_ns = timestamp_ns;
        self
    }

    /// Append a fixed-size TLV record.
    ///
    /// # Panics
    /// If the record's byte length violates the registered size rule for
    /// `tlv_type`; that is a type-registry bug, not a runtime condition.
    pub fn add_tlv<T: AsBytes>(self, tlv_type: TlvType, record: &T) -> Self {
        self.add_tlv_slice(tlv_type, record.as_bytes())
    }

    /// Append a TLV record from raw value bytes.
    ///
    /// # Panics
    /// If `value` violates the registered size rule for `tlv_type`.
    pub fn add_tlv_slice(mut self, tlv_type: TlvType, value: &[u8]) -> Self {
        if !tlv_type.accepts_len(value.len()) {
            panic!(
                "TLV size mismatch for {:?}: {} bytes violates {:?}",
                tlv_type,
                value.len(),
                tlv_type.size_constraint()
            );
        }

        let projected = self.payload.len() + TlvHeader::SIZE + value.len();
        if value.len() > u16::MAX as usize || projected > MAX_PAYLOAD_SIZE {
            self.oversized.get_or_insert(CodecError::Oversized {
                size: projected,
                max: MAX_PAYLOAD_SIZE,
            });
            return self;
        }

        let tlv_header = TlvHeader {
            tlv_type: tlv_type.into(),
            length: value.len() as u16,
        };
        self.payload.extend_from_slice(tlv_header.as_bytes());
        self.payload.extend_from_slice(value);
        self
    }

    /// Finalize the header and return the full envelope bytes.
    pub fn build(mut self) -> CodecResult<Vec<u8>> {
        if let Some(err) = self.oversized {
            return Err(err);
        }

        if self.header.timestamp_ns == 0 {
            self.header.timestamp_ns = current_timestamp_ns();
        }
        self.header.finalize_payload(&self.payload);

        let mut message = Vec::with_capacity(EnvelopeHeader::SIZE + self.payload.len());
        message.extend_from_slice(self.header.as_bytes());
        message.extend_from_slice(&self.payload);
        Ok(message)
    }
}

/// Encode a complete envelope around an already-assembled payload.
///
/// This is the raw transport operation: the payload bytes are carried
/// verbatim, whether or not they are TLV-structured.
pub fn encode_envelope(
    domain: Domain,
    source: Source,
    sequence: u64,
    payload: &[u8],
) -> CodecResult<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(CodecError::Oversized {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let mut header = EnvelopeHeader::new(domain, source);
    header.sequence = sequence;
    header.finalize_payload(payload);

    let mut message = Vec::with_capacity(EnvelopeHeader::SIZE + payload.len());
    message.extend_from_slice(header.as_bytes());
    message.extend_from_slice(payload);
    Ok(message)
}

/// Encode a symbol-mapping TLV value: `hash:u64 |` canonical UTF-8 bytes.
pub fn encode_symbol_mapping(hash: u64, canonical: &str) -> Vec<u8> {
    let mut value = Vec::with_capacity(8 + canonical.len());
    // Vec writes cannot fail
    value.write_u64::<LittleEndian>(hash).ok();
    value.extend_from_slice(canonical.as_bytes());
    value
}

/// Encode a book-snapshot TLV value: header, then bids, then asks.
pub fn encode_book_snapshot(
    symbol_hash: u64,
    sequence: u64,
    bids: &[BookLevel],
    asks: &[BookLevel],
) -> Vec<u8> {
    let header = BookSnapshotHeader {
        symbol_hash,
        sequence,
        bid_count: bids.len() as u16,
        ask_count: asks.len() as u16,
        reserved: 0,
    };

    let mut value =
        Vec::with_capacity(BookSnapshotHeader::payload_size(bids.len(), asks.len()));
    value.extend_from_slice(header.as_bytes());
    for level in bids.iter().chain(asks.iter()) {
        value.extend_from_slice(level.as_bytes());
    }
    value
}
