use thiserror::Error;

#[derive(Debug, Error)]
pub enum RingError {
    #[error("ring io: {0}")]
    Io(#[from] std::io::Error),

    #[error("ring format version mismatch: expected {expected}, got {got}")]
    FormatVersion { expected: u32, got: u32 },

    #[error("ring capacity {capacity} is not a nonzero power of two")]
    InvalidCapacity { capacity: u32 },

    #[error("ring capacity {capacity} exceeds maximum {max}")]
    CapacityTooLarge { capacity: u32, max: u32 },

    #[error("ring file truncated: need {expected} bytes, file has {actual}")]
    FileTooSmall { expected: u64, actual: u64 },

    #[error("sequence {sequence} not yet written (write sequence {write_sequence})")]
    NotYetWritten { sequence: u64, write_sequence: u64 },

    #[error("sequence {sequence} overwritten (oldest readable {oldest})")]
    Stale { sequence: u64, oldest: u64 },

    #[error("read of sequence {sequence} kept colliding with the writer")]
    RetriesExhausted { sequence: u64 },
}
