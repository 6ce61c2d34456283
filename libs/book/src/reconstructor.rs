//! Per-symbol snapshot/delta state machine.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};
use types::{BookDeltaTlv, BookLevel, BookSnapshotHeader, DeltaAction};

use crate::error::BookError;
use crate::order_book::OrderBook;

pub const DEFAULT_MAX_PENDING_DELTAS: usize = 256;

/// What happened to a delta handed to [`Reconstructor::on_delta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    /// Applied to a live book.
    Applied,
    /// Parked until the symbol's first snapshot.
    Buffered,
    /// At or behind the book's venue sequence; skipped.
    Stale,
}

/// Counters over everything this reconstructor has processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructorStats {
    pub deltas_applied: u64,
    pub deltas_buffered: u64,
    pub stale_deltas: u64,
    pub pending_dropped: u64,
    pub invariant_violations: u64,
}

#[derive(Debug)]
enum BookSlot {
    /// No snapshot yet; deltas accumulate here in arrival order.
    Pending(VecDeque<BookDeltaTlv>),
    Live(OrderBook),
}

/// Book state for every symbol one consumer owns.
///
/// Single logical owner per hash: all methods take `&mut self`. Parallelism
/// across symbols is achieved by sharding hashes over reconstructors, never
/// by sharing one.
#[derive(Debug)]
pub struct Reconstructor {
    books: HashMap<u64, BookSlot>,
    max_pending_deltas: usize,
    stats: ReconstructorStats,
}

impl Reconstructor {
    pub fn new() -> Self {
        Self::with_max_pending(DEFAULT_MAX_PENDING_DELTAS)
    }

    pub fn with_max_pending(max_pending_deltas: usize) -> Self {
        Self {
            books: HashMap::new(),
            max_pending_deltas,
            stats: ReconstructorStats::default(),
        }
    }

    /// Install a snapshot, replacing any existing book for the hash, then
    /// replay parked deltas in arrival order. Returns how many replayed
    /// deltas actually applied.
    pub fn on_snapshot(
        &mut self,
        header: &BookSnapshotHeader,
        bids: &[BookLevel],
        asks: &[BookLevel],
    ) -> usize {
        let pending = match self.books.remove(&header.symbol_hash) {
            Some(BookSlot::Pending(queue)) => queue,
            _ => VecDeque::new(),
        };

        let mut book = OrderBook::from_snapshot(header, bids, asks);
        let mut applied = 0;
        for delta in &pending {
            match apply_to_book(&mut book, delta, &mut self.stats) {
                Ok(DeltaOutcome::Applied) => applied += 1,
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        hash = format_args!("{:#018x}", header.symbol_hash),
                        %err, "discarded malformed buffered delta"
                    );
                }
            }
        }
        debug!(
            hash = format_args!("{:#018x}", header.symbol_hash),
            sequence = header.sequence,
            replayed = applied,
            "book live"
        );
        self.books.insert(header.symbol_hash, BookSlot::Live(book));
        applied
    }

    /// Route a delta: apply if the book is live, park it otherwise.
    pub fn on_delta(&mut self, delta: &BookDeltaTlv) -> Result<DeltaOutcome, BookError> {
        let slot = self
            .books
            .entry(delta.symbol_hash)
            .or_insert_with(|| BookSlot::Pending(VecDeque::new()));
        match slot {
            BookSlot::Live(book) => apply_to_book(book, delta, &mut self.stats),
            BookSlot::Pending(queue) => {
                queue.push_back(*delta);
                if queue.len() > self.max_pending_deltas {
                    queue.pop_front();
                    self.stats.pending_dropped += 1;
                    warn!(
                        hash = format_args!("{:#018x}", delta.symbol_hash),
                        cap = self.max_pending_deltas,
                        "pending delta queue full, dropped oldest"
                    );
                }
                self.stats.deltas_buffered += 1;
                Ok(DeltaOutcome::Buffered)
            }
        }
    }

    /// Administrative reset: the book (or its pending queue) is discarded
    /// and the hash is uninitialized again. Returns whether a live book was
    /// torn down.
    pub fn on_reset(&mut self, symbol_hash: u64) -> bool {
        let was_live = matches!(self.books.remove(&symbol_hash), Some(BookSlot::Live(_)));
        if was_live {
            debug!(
                hash = format_args!("{symbol_hash:#018x}"),
                "book reset to uninitialized"
            );
        }
        was_live
    }

    pub fn book(&self, symbol_hash: u64) -> Option<&OrderBook> {
        match self.books.get(&symbol_hash) {
            Some(BookSlot::Live(book)) => Some(book),
            _ => None,
        }
    }

    pub fn is_live(&self, symbol_hash: u64) -> bool {
        self.book(symbol_hash).is_some()
    }

    /// Deltas currently parked for a hash with no snapshot yet.
    pub fn pending_count(&self, symbol_hash: u64) -> usize {
        match self.books.get(&symbol_hash) {
            Some(BookSlot::Pending(queue)) => queue.len(),
            _ => 0,
        }
    }

    pub fn tracked_symbols(&self) -> usize {
        self.books.len()
    }

    pub fn stats(&self) -> ReconstructorStats {
        self.stats
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_to_book(
    book: &mut OrderBook,
    delta: &BookDeltaTlv,
    stats: &mut ReconstructorStats,
) -> Result<DeltaOutcome, BookError> {
    let side = delta.side().map_err(BookError::InvalidSide)?;
    let action = delta.action().map_err(BookError::InvalidAction)?;

    // The snapshot already reflects anything at or before its sequence.
    if delta.sequence <= book.sequence() {
        stats.stale_deltas += 1;
        return Ok(DeltaOutcome::Stale);
    }

    match action {
        DeltaAction::Set => book.set_level(side, delta.price, delta.size),
        DeltaAction::Delete => book.delete_level(side, delta.price),
    }
    book.set_sequence(delta.sequence);
    stats.deltas_applied += 1;

    if book.is_crossed() {
        stats.invariant_violations += 1;
        warn!(
            hash = format_args!("{:#018x}", book.symbol_hash()),
            sequence = delta.sequence,
            bid = ?book.best_bid(),
            ask = ?book.best_ask(),
            "book crossed after delta"
        );
    }
    Ok(DeltaOutcome::Applied)
}
