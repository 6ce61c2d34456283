//! Per-publisher sequence continuity tracking.
//!
//! Every publisher numbers its envelopes independently, starting at zero on
//! process start. The relay tracks the next expected sequence per
//! (domain, source) pair purely to make loss visible; a gap never blocks
//! forwarding. Restarted publishers reset to zero, which shows up as a single
//! out-of-order observation before tracking resynchronizes.

use dashmap::DashMap;

/// Outcome of observing one envelope's sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    /// Sequence matched expectation (or the publisher was seen for the
    /// first time).
    Ok,
    /// One or more envelopes were missed. Tracking jumps forward to resume
    /// from the observed sequence.
    Gap { expected: u64, got: u64 },
    /// Sequence ran backwards, typically a publisher restart. The envelope
    /// is still forwarded; expectation resets from the observed sequence.
    OutOfOrder { expected: u64, got: u64 },
}

/// Tracks next expected sequence per (domain, source) publisher.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    expected: DashMap<(u8, u8), u64>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observed sequence and report how it relates to the
    /// expected one. Expectation always advances to `sequence + 1` so a
    /// single fault is reported once, not once per subsequent envelope.
    pub fn observe(&self, domain: u8, source: u8, sequence: u64) -> SequenceCheck {
        let mut entry = self.expected.entry((domain, source)).or_insert(sequence);
        let expected = *entry;
        *entry = sequence.wrapping_add(1);

        if sequence == expected {
            SequenceCheck::Ok
        } else if sequence > expected {
            SequenceCheck::Gap {
                expected,
                got: sequence,
            }
        } else {
            SequenceCheck::OutOfOrder {
                expected,
                got: sequence,
            }
        }
    }

    /// Number of distinct publishers seen so far.
    pub fn publishers(&self) -> usize {
        self.expected.len()
    }
}
