//! Single-writer side of the ring.

use std::fs::OpenOptions;
use std::path::Path;
use std::ptr;
use std::sync::atomic::{fence, Ordering};

use memmap2::{MmapMut, MmapOptions};

use crate::error::RingError;
use crate::layout::{RingHeader, TradeRecord, FORMAT_VERSION, MAX_CAPACITY};

/// Owns the ring file and its one write cursor.
///
/// Exactly one writer per ring file; `&mut self` on [`write`](Self::write)
/// enforces that within a process and the file lifecycle convention (one
/// creating service per path) enforces it across processes.
pub struct RingWriter {
    mmap: MmapMut,
    capacity: u64,
}

impl RingWriter {
    /// Create the ring file at `path`, re-initializing whatever was there.
    pub fn create(path: impl AsRef<Path>, capacity: u32) -> Result<Self, RingError> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(RingError::InvalidCapacity { capacity });
        }
        if capacity > MAX_CAPACITY {
            return Err(RingError::CapacityTooLarge {
                capacity,
                max: MAX_CAPACITY,
            });
        }

        let total = RingHeader::SIZE as u64 + capacity as u64 * TradeRecord::SIZE as u64;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        file.set_len(total)?;

        let mut mmap = unsafe { MmapOptions::new().len(total as usize).map_mut(&file)? };
        unsafe {
            let header = &mut *(mmap.as_mut_ptr() as *mut RingHeader);
            header.format_version = FORMAT_VERSION;
            header.capacity = capacity;
            header.write_sequence.store(0, Ordering::Release);
            header.reserved = [0; 48];
        }

        Ok(Self {
            mmap,
            capacity: capacity as u64,
        })
    }

    /// Fill the next slot and publish it; returns the assigned sequence.
    ///
    /// The slot is written completely before `write_sequence` moves, so no
    /// published sequence ever refers to a half-written record.
    pub fn write(&mut self, record: &TradeRecord) -> u64 {
        let sequence = self.header().write_sequence.load(Ordering::Relaxed);
        let index = (sequence % self.capacity) as usize;
        unsafe {
            let slot = self
                .mmap
                .as_mut_ptr()
                .add(RingHeader::SIZE + index * TradeRecord::SIZE)
                as *mut TradeRecord;
            ptr::write_volatile(slot, *record);
        }
        fence(Ordering::Release);
        self.header()
            .write_sequence
            .store(sequence + 1, Ordering::Release);
        sequence
    }

    /// Count of records ever written (next sequence to be assigned).
    pub fn write_sequence(&self) -> u64 {
        self.header().write_sequence.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }

    fn header(&self) -> &RingHeader {
        unsafe { &*(self.mmap.as_ptr() as *const RingHeader) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use types::TradeSide;

    #[test]
    fn test_create_rejects_bad_capacity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.ring");

        assert!(matches!(
            RingWriter::create(&path, 0),
            Err(RingError::InvalidCapacity { capacity: 0 })
        ));
        assert!(matches!(
            RingWriter::create(&path, 3),
            Err(RingError::InvalidCapacity { capacity: 3 })
        ));
        assert!(matches!(
            RingWriter::create(&path, MAX_CAPACITY * 2),
            Err(RingError::CapacityTooLarge { .. })
        ));
    }

    #[test]
    fn test_create_resets_existing_ring() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.ring");

        let mut writer = RingWriter::create(&path, 8).unwrap();
        let record = TradeRecord::new(1, "BTC-USD", "kraken", 100.0, 1.0, TradeSide::Buy);
        writer.write(&record);
        writer.write(&record);
        assert_eq!(writer.write_sequence(), 2);
        drop(writer);

        let writer = RingWriter::create(&path, 8).unwrap();
        assert_eq!(writer.write_sequence(), 0);
    }

    #[test]
    fn test_write_assigns_sequences() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trades.ring");

        let mut writer = RingWriter::create(&path, 4).unwrap();
        let record = TradeRecord::new(1, "ETH-USD", "coinbase", 2000.0, 0.1, TradeSide::Sell);
        assert_eq!(writer.write(&record), 0);
        assert_eq!(writer.write(&record), 1);
        assert_eq!(writer.write_sequence(), 2);
        assert_eq!(writer.capacity(), 4);
    }
}
