//! Bounded holding area for events that arrive before their symbol mapping.
//!
//! A consumer that joins mid-stream routinely sees trades and deltas for a
//! hash it cannot resolve yet. Rather than dropping them outright, it parks
//! them here keyed by hash and claims them once the `SymbolMapping` TLV
//! lands. Both dimensions are bounded: at most `max_events_per_hash` events
//! are held per hash (oldest dropped first past the cap) and nothing is held
//! longer than `ttl`. Drops are counted, never fatal.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

pub const DEFAULT_MAX_EVENTS_PER_HASH: usize = 64;
pub const DEFAULT_EVENT_TTL: Duration = Duration::from_secs(5);

/// Per-hash FIFO of events waiting on a symbol mapping.
#[derive(Debug)]
pub struct PendingSymbolEvents<T> {
    events: DashMap<u64, VecDeque<(Instant, T)>>,
    max_events_per_hash: usize,
    ttl: Duration,
    dropped_overflow: AtomicU64,
    dropped_expired: AtomicU64,
}

impl<T> PendingSymbolEvents<T> {
    pub fn new() -> Self {
        Self::with_bounds(DEFAULT_MAX_EVENTS_PER_HASH, DEFAULT_EVENT_TTL)
    }

    pub fn with_bounds(max_events_per_hash: usize, ttl: Duration) -> Self {
        Self {
            events: DashMap::new(),
            max_events_per_hash,
            ttl,
            dropped_overflow: AtomicU64::new(0),
            dropped_expired: AtomicU64::new(0),
        }
    }

    /// Park an event for an unresolved hash.
    ///
    /// Past the per-hash cap the oldest parked event is dropped to make room,
    /// so a hash whose mapping never arrives settles into bounded memory.
    pub fn push(&self, hash: u64, event: T) {
        let mut queue = self.events.entry(hash).or_default();
        queue.push_back((Instant::now(), event));
        if queue.len() > self.max_events_per_hash {
            queue.pop_front();
            self.dropped_overflow.fetch_add(1, Ordering::Relaxed);
            debug!(
                hash = format_args!("{hash:#018x}"),
                cap = self.max_events_per_hash,
                "pending symbol queue full, dropped oldest event"
            );
        }
    }

    /// Take everything parked for `hash`, in arrival order.
    ///
    /// Called when the mapping arrives. Events that outlived the TTL while
    /// waiting are dropped here rather than returned.
    pub fn claim(&self, hash: u64) -> Vec<T> {
        let Some((_, queue)) = self.events.remove(&hash) else {
            return Vec::new();
        };

        let mut live = Vec::with_capacity(queue.len());
        let mut expired = 0u64;
        for (inserted, event) in queue {
            if inserted.elapsed() > self.ttl {
                expired += 1;
            } else {
                live.push(event);
            }
        }
        if expired > 0 {
            self.dropped_expired.fetch_add(expired, Ordering::Relaxed);
            debug!(
                hash = format_args!("{hash:#018x}"),
                expired, "dropped expired events while claiming"
            );
        }
        live
    }

    /// Drop every event past its TTL; returns how many were dropped.
    ///
    /// Owners run this periodically so hashes that never resolve do not pin
    /// memory until a claim happens to touch them.
    pub fn sweep(&self) -> u64 {
        let mut swept = 0u64;
        self.events.retain(|_, queue| {
            while queue
                .front()
                .is_some_and(|(inserted, _)| inserted.elapsed() > self.ttl)
            {
                queue.pop_front();
                swept += 1;
            }
            !queue.is_empty()
        });
        if swept > 0 {
            self.dropped_expired.fetch_add(swept, Ordering::Relaxed);
        }
        swept
    }

    /// Number of events currently parked for `hash`.
    pub fn buffered(&self, hash: u64) -> usize {
        self.events.get(&hash).map_or(0, |queue| queue.len())
    }

    /// Number of distinct hashes with parked events.
    pub fn waiting_hashes(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn dropped_overflow(&self) -> u64 {
        self.dropped_overflow.load(Ordering::Relaxed)
    }

    pub fn dropped_expired(&self) -> u64 {
        self.dropped_expired.load(Ordering::Relaxed)
    }
}

impl<T> Default for PendingSymbolEvents<T> {
    fn default() -> Self {
        Self::new()
    }
}
