//! Lock-free reader side of the ring.

use std::fs::OpenOptions;
use std::path::Path;
use std::ptr;
use std::sync::atomic::Ordering;
use std::time::Duration;

use memmap2::{Mmap, MmapOptions};
use tracing::debug;

use crate::error::RingError;
use crate::layout::{RingHeader, TradeRecord, FORMAT_VERSION};

/// Reads that collide with the writer are retried this many times.
const READ_RETRIES: u32 = 3;

/// Read-only view of a ring file plus a poll cursor.
///
/// [`read_at`](Self::read_at) is stateless seqlock access by sequence
/// number; [`poll`](Self::poll) drains everything published since the last
/// poll. The cursor starts at the write sequence observed at open, so a
/// late-opening reader sees only records published after it attached.
pub struct RingReader {
    mmap: Mmap,
    capacity: u64,
    cursor: u64,
}

impl RingReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RingError> {
        let file = OpenOptions::new().read(true).open(path)?;

        // Length check before mapping: a writer caught between create and
        // set_len leaves a zero-length file, which cannot be mapped at all.
        let file_len = file.metadata()?.len();
        if file_len < RingHeader::SIZE as u64 {
            return Err(RingError::FileTooSmall {
                expected: RingHeader::SIZE as u64,
                actual: file_len,
            });
        }

        let mmap = unsafe { MmapOptions::new().map(&file)? };
        let header = unsafe { &*(mmap.as_ptr() as *const RingHeader) };
        if header.format_version != FORMAT_VERSION {
            return Err(RingError::FormatVersion {
                expected: FORMAT_VERSION,
                got: header.format_version,
            });
        }
        let capacity = header.capacity;
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(RingError::InvalidCapacity { capacity });
        }
        let expected = RingHeader::SIZE as u64 + capacity as u64 * TradeRecord::SIZE as u64;
        if (mmap.len() as u64) < expected {
            return Err(RingError::FileTooSmall {
                expected,
                actual: mmap.len() as u64,
            });
        }

        let cursor = header.write_sequence.load(Ordering::Acquire);
        Ok(Self {
            mmap,
            capacity: capacity as u64,
            cursor,
        })
    }

    /// Open, polling for the file if the writer has not created it yet.
    ///
    /// Readers routinely start before the writing service; a missing or
    /// still-initializing file is retried up to `max_retries` times.
    pub fn open_with_retry(
        path: impl AsRef<Path>,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Result<Self, RingError> {
        let path = path.as_ref();
        let mut retries = 0;
        loop {
            match Self::open(path) {
                Ok(reader) => return Ok(reader),
                Err(err) if retries < max_retries && still_initializing(&err) => {
                    retries += 1;
                    std::thread::sleep(retry_delay);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Copy out the record published at `sequence`.
    ///
    /// Seqlock read: copy the slot, then re-check `write_sequence`. If the
    /// writer lapped into the slot during the copy the result is discarded
    /// and retried. Sequences a full lap behind the writer are refused
    /// without touching slot memory, including the exact one-lap boundary,
    /// whose slot the writer may start overwriting at any moment.
    pub fn read_at(&self, sequence: u64) -> Result<TradeRecord, RingError> {
        let mut attempts = 0;
        loop {
            let s1 = self.header().write_sequence.load(Ordering::Acquire);
            if sequence >= s1 {
                return Err(RingError::NotYetWritten {
                    sequence,
                    write_sequence: s1,
                });
            }
            if sequence.saturating_add(self.capacity) <= s1 {
                return Err(RingError::Stale {
                    sequence,
                    oldest: s1 - self.capacity + 1,
                });
            }

            let index = (sequence % self.capacity) as usize;
            let record = unsafe {
                ptr::read_volatile(
                    self.mmap
                        .as_ptr()
                        .add(RingHeader::SIZE + index * TradeRecord::SIZE)
                        as *const TradeRecord,
                )
            };

            let s2 = self.header().write_sequence.load(Ordering::Acquire);
            if sequence.saturating_add(self.capacity) > s2 {
                return Ok(record);
            }

            attempts += 1;
            if attempts >= READ_RETRIES {
                return Err(RingError::RetriesExhausted { sequence });
            }
        }
    }

    /// Drain every record published since the previous poll.
    ///
    /// A reader that fell a full lap behind jumps forward to the oldest
    /// intact record and logs the skip; it never blocks the writer.
    pub fn poll(&mut self) -> Vec<TradeRecord> {
        let write_sequence = self.header().write_sequence.load(Ordering::Acquire);
        let oldest = self.oldest_readable_at(write_sequence);
        if self.cursor < oldest {
            debug!(
                skipped = oldest - self.cursor,
                "ring reader lagged a full lap, jumping forward"
            );
            self.cursor = oldest;
        }

        let mut records = Vec::with_capacity((write_sequence - self.cursor) as usize);
        while self.cursor < write_sequence {
            match self.read_at(self.cursor) {
                Ok(record) => {
                    records.push(record);
                    self.cursor += 1;
                }
                Err(RingError::Stale { oldest, .. }) => {
                    // Writer lapped us mid-poll; skip to what survives.
                    self.cursor = oldest;
                }
                Err(_) => break,
            }
        }
        records
    }

    /// Count of records ever written.
    pub fn write_sequence(&self) -> u64 {
        self.header().write_sequence.load(Ordering::Acquire)
    }

    /// Lowest sequence still guaranteed intact.
    pub fn oldest_readable(&self) -> u64 {
        self.oldest_readable_at(self.write_sequence())
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    fn oldest_readable_at(&self, write_sequence: u64) -> u64 {
        write_sequence.saturating_sub(self.capacity - 1)
    }

    fn header(&self) -> &RingHeader {
        unsafe { &*(self.mmap.as_ptr() as *const RingHeader) }
    }
}

fn still_initializing(err: &RingError) -> bool {
    match err {
        RingError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
        // A file that exists but is zero-length or all zeroes is a writer
        // caught between create and header init.
        RingError::FileTooSmall { .. } => true,
        RingError::FormatVersion { got: 0, .. } => true,
        _ => false,
    }
}
