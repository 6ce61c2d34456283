//! Envelope and TLV parsing
//!
//! [`decode`] judges whether the byte buffer holds one complete, valid
//! envelope; it never blocks and never consumes, the caller drains
//! `frame_len` bytes on success. Header and record structs are read by copy
//! (`zerocopy::FromBytes::read_from`) because after a resynchronization the
//! buffer head can sit at any byte offset and alignment-checked casts would
//! spuriously fail.

use crate::error::{CodecError, CodecResult};
use byteorder::{ByteOrder, LittleEndian};
use types::{BookLevel, BookSnapshotHeader, EnvelopeHeader, TlvHeader, TlvType};
use zerocopy::FromBytes;

/// One complete envelope, borrowed from the receive buffer.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    pub header: EnvelopeHeader,
    pub payload: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Total wire length of this envelope (header + payload)
    pub fn frame_len(&self) -> usize {
        EnvelopeHeader::SIZE + self.payload.len()
    }

    /// Iterate the TLV records in the payload
    pub fn tlvs(&self) -> TlvIter<'a> {
        TlvIter::new(self.payload)
    }
}

/// Parse and validate the header at the front of `data`.
///
/// Returns the header and the full frame length. `Incomplete` means keep
/// accumulating; `Framing` means the bytes at the head are not a message
/// boundary and the caller must resynchronize.
pub fn decode_header(data: &[u8]) -> CodecResult<(EnvelopeHeader, usize)> {
    if data.len() < EnvelopeHeader::SIZE {
        return Err(CodecError::Incomplete {
            need: EnvelopeHeader::SIZE,
            have: data.len(),
        });
    }

    // read_from cannot fail here; length was just checked
    let header = EnvelopeHeader::read_from(&data[..EnvelopeHeader::SIZE]).ok_or(
        CodecError::Incomplete {
            need: EnvelopeHeader::SIZE,
            have: data.len(),
        },
    )?;
    header.validate()?;

    let frame_len = EnvelopeHeader::SIZE + header.payload_size as usize;
    if data.len() < frame_len {
        return Err(CodecError::Incomplete {
            need: frame_len,
            have: data.len(),
        });
    }

    Ok((header, frame_len))
}

/// Decode one complete envelope from the front of `data`, verifying the
/// payload checksum.
pub fn decode(data: &[u8]) -> CodecResult<Envelope<'_>> {
    let (header, frame_len) = decode_header(data)?;
    let payload = &data[EnvelopeHeader::SIZE..frame_len];

    if !header.verify_checksum(payload) {
        return Err(CodecError::ChecksumMismatch {
            expected: header.checksum,
            calculated: types::envelope::payload_checksum(payload),
        });
    }

    Ok(Envelope { header, payload })
}

/// One raw TLV record inside a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTlv<'a> {
    pub tlv_type: u16,
    pub value: &'a [u8],
}

impl RawTlv<'_> {
    /// The registered type, if this record is one we know
    pub fn known_type(&self) -> Option<TlvType> {
        TlvType::try_from(self.tlv_type).ok()
    }
}

/// Iterator over the TLV records of a payload.
///
/// Unknown types are yielded as raw records so callers can skip them; a
/// record whose declared length overruns the payload yields one `Err` and
/// then the iterator ends.
pub struct TlvIter<'a> {
    payload: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> TlvIter<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            payload,
            offset: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for TlvIter<'a> {
    type Item = CodecResult<RawTlv<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.payload.len() {
            return None;
        }

        let remaining = &self.payload[self.offset..];
        if remaining.len() < TlvHeader::SIZE {
            self.failed = true;
            return Some(Err(CodecError::TruncatedTlv {
                offset: self.offset,
                declared: TlvHeader::SIZE,
                available: remaining.len(),
            }));
        }

        let tlv_type = LittleEndian::read_u16(&remaining[0..2]);
        let length = LittleEndian::read_u16(&remaining[2..4]) as usize;
        let available = remaining.len() - TlvHeader::SIZE;
        if length > available {
            self.failed = true;
            return Some(Err(CodecError::TruncatedTlv {
                offset: self.offset,
                declared: length,
                available,
            }));
        }

        let value = &remaining[TlvHeader::SIZE..TlvHeader::SIZE + length];
        self.offset += TlvHeader::SIZE + length;
        Some(Ok(RawTlv { tlv_type, value }))
    }
}

/// Find the first TLV of the given type, skipping unknown records.
pub fn find_tlv<'a>(payload: &'a [u8], wanted: TlvType) -> CodecResult<Option<&'a [u8]>> {
    for record in TlvIter::new(payload) {
        let record = record?;
        if record.tlv_type == u16::from(wanted) {
            return Ok(Some(record.value));
        }
    }
    Ok(None)
}

/// Extract the first TLV of the given type as a fixed-size record.
pub fn extract_tlv<T: FromBytes>(payload: &[u8], wanted: TlvType) -> CodecResult<T> {
    let value = find_tlv(payload, wanted)?.ok_or(CodecError::MissingTlv(wanted))?;
    if !wanted.accepts_len(value.len()) {
        return Err(CodecError::TlvSizeMismatch {
            tlv_type: wanted,
            len: value.len(),
        });
    }
    T::read_from(value).ok_or(CodecError::TlvSizeMismatch {
        tlv_type: wanted,
        len: value.len(),
    })
}

/// Parse a symbol-mapping TLV value into `(hash, canonical)`.
pub fn parse_symbol_mapping(value: &[u8]) -> CodecResult<(u64, &str)> {
    if value.len() < 9 {
        return Err(CodecError::Malformed {
            record: "symbol mapping",
            detail: "shorter than hash + one canonical byte",
        });
    }
    let hash = LittleEndian::read_u64(&value[..8]);
    let canonical = std::str::from_utf8(&value[8..]).map_err(|_| CodecError::Malformed {
        record: "symbol mapping",
        detail: "canonical string is not UTF-8",
    })?;
    Ok((hash, canonical))
}

/// Parse a book-snapshot TLV value into its header and level lists.
pub fn parse_book_snapshot(
    value: &[u8],
) -> CodecResult<(BookSnapshotHeader, Vec<BookLevel>, Vec<BookLevel>)> {
    let header = BookSnapshotHeader::read_from(value.get(..BookSnapshotHeader::SIZE).ok_or(
        CodecError::Malformed {
            record: "book snapshot",
            detail: "shorter than the snapshot header",
        },
    )?)
    .ok_or(CodecError::Malformed {
        record: "book snapshot",
        detail: "snapshot header unreadable",
    })?;

    let levels = header.bid_count as usize + header.ask_count as usize;
    let expected = BookSnapshotHeader::SIZE + levels * BookLevel::SIZE;
    if value.len() != expected {
        return Err(CodecError::Malformed {
            record: "book snapshot",
            detail: "level counts disagree with value length",
        });
    }

    let mut read_levels = |start: usize, count: usize| -> Vec<BookLevel> {
        (0..count)
            .filter_map(|i| {
                let at = start + i * BookLevel::SIZE;
                BookLevel::read_from(&value[at..at + BookLevel::SIZE])
            })
            .collect()
    };

    let bids = read_levels(BookSnapshotHeader::SIZE, header.bid_count as usize);
    let asks = read_levels(
        BookSnapshotHeader::SIZE + header.bid_count as usize * BookLevel::SIZE,
        header.ask_count as usize,
    );
    Ok((header, bids, asks))
}
