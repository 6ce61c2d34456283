//! Relay channel counters.
//!
//! All counters are plain atomics bumped on the hot path and read by the
//! periodic reporting task. There is no metrics endpoint; the summary line
//! in the log is the operational surface.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one relay instance, shared across all connection tasks.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    envelopes_forwarded: AtomicU64,
    bytes_forwarded: AtomicU64,
    bytes_skipped: AtomicU64,
    checksum_drops: AtomicU64,
    sequence_gaps: AtomicU64,
    sequence_out_of_order: AtomicU64,
    lagged_drops: AtomicU64,
    policy_disconnects: AtomicU64,
    connections_accepted: AtomicU64,
    connections_refused: AtomicU64,
    heartbeats_sent: AtomicU64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_forward(&self, bytes: usize) {
        self.envelopes_forwarded.fetch_add(1, Ordering::Relaxed);
        self.bytes_forwarded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Bytes discarded while hunting for the next envelope boundary.
    pub fn add_bytes_skipped(&self, count: u64) {
        if count > 0 {
            self.bytes_skipped.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Envelopes dropped whole because their payload failed CRC32.
    pub fn add_checksum_drops(&self, count: u64) {
        if count > 0 {
            self.checksum_drops.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub fn record_gap(&self) {
        self.sequence_gaps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_out_of_order(&self) {
        self.sequence_out_of_order.fetch_add(1, Ordering::Relaxed);
    }

    /// Envelopes a lagging consumer lost to the drop-oldest policy.
    pub fn add_lagged_drops(&self, count: u64) {
        self.lagged_drops.fetch_add(count, Ordering::Relaxed);
    }

    /// Consumers disconnected by the lag policy.
    pub fn record_policy_disconnect(&self) {
        self.policy_disconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accept(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refusal(&self) {
        self.connections_refused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_heartbeat(&self) {
        self.heartbeats_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn envelopes_forwarded(&self) -> u64 {
        self.envelopes_forwarded.load(Ordering::Relaxed)
    }

    pub fn bytes_forwarded(&self) -> u64 {
        self.bytes_forwarded.load(Ordering::Relaxed)
    }

    pub fn bytes_skipped(&self) -> u64 {
        self.bytes_skipped.load(Ordering::Relaxed)
    }

    pub fn checksum_drops(&self) -> u64 {
        self.checksum_drops.load(Ordering::Relaxed)
    }

    pub fn sequence_gaps(&self) -> u64 {
        self.sequence_gaps.load(Ordering::Relaxed)
    }

    pub fn sequence_out_of_order(&self) -> u64 {
        self.sequence_out_of_order.load(Ordering::Relaxed)
    }

    pub fn lagged_drops(&self) -> u64 {
        self.lagged_drops.load(Ordering::Relaxed)
    }

    pub fn policy_disconnects(&self) -> u64 {
        self.policy_disconnects.load(Ordering::Relaxed)
    }

    pub fn connections_accepted(&self) -> u64 {
        self.connections_accepted.load(Ordering::Relaxed)
    }

    pub fn connections_refused(&self) -> u64 {
        self.connections_refused.load(Ordering::Relaxed)
    }

    pub fn heartbeats_sent(&self) -> u64 {
        self.heartbeats_sent.load(Ordering::Relaxed)
    }
}

impl fmt::Display for RelayMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "forwarded={} bytes={} skipped={} checksum_drops={} gaps={} \
             out_of_order={} lagged_drops={} policy_disconnects={} \
             accepted={} refused={} heartbeats={}",
            self.envelopes_forwarded(),
            self.bytes_forwarded(),
            self.bytes_skipped(),
            self.checksum_drops(),
            self.sequence_gaps(),
            self.sequence_out_of_order(),
            self.lagged_drops(),
            self.policy_disconnects(),
            self.connections_accepted(),
            self.connections_refused(),
            self.heartbeats_sent(),
        )
    }
}
