//! Stream framing and resynchronization
//!
//! A stream socket delivers bytes, not messages: partial envelopes, several
//! envelopes per read, and (after a producer bug or transport fault) garbage
//! between envelopes. [`FrameDecoder`] owns the accumulating buffer and runs
//! an explicit state machine over it:
//!
//! ```text
//! Seeking  - buffer head not known to be on an envelope boundary;
//!            scan forward byte by byte for the magic
//! Framing  - head is magic-aligned; accumulating until header +
//!            declared payload are all present
//! Draining - a complete envelope sits at the head, ready to emit
//! ```
//!
//! A framing failure never ends a connection; the decoder slips one byte
//! and keeps scanning, counting what it discarded as a data-quality signal.
//! A checksum failure drops exactly one well-framed envelope.

use crate::error::CodecError;
use crate::parser::decode_header;
use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, warn};
use types::{EnvelopeHeader, MESSAGE_MAGIC};

const MESSAGE_MAGIC_BYTES: [u8; 4] = MESSAGE_MAGIC.to_le_bytes();

/// Decoder position relative to the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Seeking,
    Framing,
    Draining,
}

/// One complete envelope, verbatim wire bytes plus the parsed header.
///
/// `bytes` is the exact byte range received, suitable for rebroadcast
/// without re-encoding.
#[derive(Debug, Clone)]
pub struct Frame {
    pub header: EnvelopeHeader,
    pub bytes: Bytes,
}

/// Incremental envelope decoder over an accumulating buffer.
pub struct FrameDecoder {
    buf: BytesMut,
    state: DecoderState,
    verify_checksums: bool,
    skipped_bytes: u64,
    checksum_drops: u64,
    frames_decoded: u64,
}

impl FrameDecoder {
    /// Decoder with payload checksum verification on.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(8 * 1024),
            state: DecoderState::Seeking,
            verify_checksums: true,
            skipped_bytes: 0,
            checksum_drops: 0,
            frames_decoded: 0,
        }
    }

    /// Decoder that frames without verifying payload checksums.
    ///
    /// Used on channels configured for throughput over integrity; framing
    /// validation (magic, domain, size bounds) still applies.
    pub fn without_checksum_verification() -> Self {
        Self {
            verify_checksums: false,
            ..Self::new()
        }
    }

    /// Append received bytes and reclassify the buffer head.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.advance_state();
    }

    /// Pop the next complete envelope, if one is ready.
    ///
    /// Corrupt-payload envelopes are dropped internally (counted in
    /// [`checksum_drops`](Self::checksum_drops)) and the scan continues, so
    /// `None` always means "nothing emittable yet", never "stuck".
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            self.advance_state();
            if self.state != DecoderState::Draining {
                return None;
            }

            let (header, frame_len) = match decode_header(&self.buf) {
                Ok(parsed) => parsed,
                // Draining implies a parseable head; reclassify if not
                Err(_) => {
                    self.state = DecoderState::Seeking;
                    continue;
                }
            };

            if self.verify_checksums {
                let payload = &self.buf[EnvelopeHeader::SIZE..frame_len];
                if !header.verify_checksum(payload) {
                    warn!(
                        sequence = header.sequence,
                        domain = header.domain,
                        source = header.source,
                        "dropping envelope with corrupt payload"
                    );
                    self.checksum_drops += 1;
                    self.buf.advance(frame_len);
                    self.state = DecoderState::Seeking;
                    continue;
                }
            }

            let bytes = self.buf.split_to(frame_len).freeze();
            self.frames_decoded += 1;
            self.state = DecoderState::Seeking;
            self.advance_state();
            return Some(Frame { header, bytes });
        }
    }

    /// Current state of the head of the buffer.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Total garbage bytes discarded during resynchronization.
    pub fn skipped_bytes(&self) -> u64 {
        self.skipped_bytes
    }

    /// Envelopes dropped for payload corruption.
    pub fn checksum_drops(&self) -> u64 {
        self.checksum_drops
    }

    /// Envelopes successfully emitted.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Bytes currently buffered (diagnostics).
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    fn advance_state(&mut self) {
        loop {
            match self.state {
                DecoderState::Seeking => {
                    if !self.seek_magic() {
                        return;
                    }
                    self.state = DecoderState::Framing;
                }
                DecoderState::Framing => match decode_header(&self.buf) {
                    Ok(_) => {
                        self.state = DecoderState::Draining;
                        return;
                    }
                    Err(CodecError::Incomplete { .. }) => return,
                    // Magic bytes inside garbage; not a real boundary
                    Err(_) => {
                        self.buf.advance(1);
                        self.skipped_bytes += 1;
                        self.state = DecoderState::Seeking;
                    }
                },
                DecoderState::Draining => return,
            }
        }
    }

    /// Discard bytes until the buffer head carries the full magic.
    ///
    /// Returns false when more input is needed (empty buffer, no candidate,
    /// or a partial candidate at the tail).
    fn seek_magic(&mut self) -> bool {
        let magic = MESSAGE_MAGIC_BYTES;
        let mut run = 0u64;
        let aligned = loop {
            if self.buf.is_empty() {
                break false;
            }
            match self.buf.iter().position(|&b| b == magic[0]) {
                None => {
                    run += self.buf.len() as u64;
                    self.buf.clear();
                    break false;
                }
                Some(at) => {
                    if at > 0 {
                        run += at as u64;
                        self.buf.advance(at);
                    }
                    if self.buf.len() < magic.len() {
                        break false; // partial candidate, wait
                    }
                    if self.buf[..magic.len()] == magic[..] {
                        break true;
                    }
                    self.buf.advance(1);
                    run += 1;
                }
            }
        };

        if run > 0 {
            self.skipped_bytes += run;
            debug!(skipped = run, "resynchronized past non-protocol bytes");
        }
        aligned
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
