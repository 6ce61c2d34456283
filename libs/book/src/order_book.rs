//! Price-level state for a single symbol.

use std::collections::BTreeMap;

use types::{BookLevel, BookSide, BookSnapshotHeader};

/// Prices live in the book as integer ticks of 1e-8 so level identity and
/// ordering are exact; f64 is a wire and presentation format only.
const PRICE_SCALE: f64 = 1e8;

fn to_ticks(price: f64) -> i64 {
    (price * PRICE_SCALE).round() as i64
}

fn to_price(ticks: i64) -> f64 {
    ticks as f64 / PRICE_SCALE
}

/// L2 book: bids and asks as price-to-size maps plus the venue sequence the
/// state reflects.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBook {
    symbol_hash: u64,
    sequence: u64,
    bids: BTreeMap<i64, f64>,
    asks: BTreeMap<i64, f64>,
}

impl OrderBook {
    pub fn new(symbol_hash: u64) -> Self {
        Self {
            symbol_hash,
            sequence: 0,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    pub fn from_snapshot(
        header: &BookSnapshotHeader,
        bids: &[BookLevel],
        asks: &[BookLevel],
    ) -> Self {
        let mut book = Self::new(header.symbol_hash);
        book.sequence = header.sequence;
        for level in bids {
            book.set_level(BookSide::Bid, level.price, level.size);
        }
        for level in asks {
            book.set_level(BookSide::Ask, level.price, level.size);
        }
        book
    }

    pub fn symbol_hash(&self) -> u64 {
        self.symbol_hash
    }

    /// Venue sequence of the last applied snapshot or delta.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// Install or replace a level; size zero removes it.
    pub fn set_level(&mut self, side: BookSide, price: f64, size: f64) {
        let ticks = to_ticks(price);
        let levels = self.side_mut(side);
        if size == 0.0 {
            levels.remove(&ticks);
        } else {
            levels.insert(ticks, size);
        }
    }

    pub fn delete_level(&mut self, side: BookSide, price: f64) {
        self.side_mut(side).remove(&to_ticks(price));
    }

    /// Highest bid as `(price, size)`.
    pub fn best_bid(&self) -> Option<(f64, f64)> {
        self.bids
            .iter()
            .next_back()
            .map(|(&ticks, &size)| (to_price(ticks), size))
    }

    /// Lowest ask as `(price, size)`.
    pub fn best_ask(&self) -> Option<(f64, f64)> {
        self.asks
            .iter()
            .next()
            .map(|(&ticks, &size)| (to_price(ticks), size))
    }

    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid, _)), Some((ask, _))) => Some(ask - bid),
            _ => None,
        }
    }

    /// A consistent book keeps best bid strictly below best ask.
    pub fn is_crossed(&self) -> bool {
        matches!(
            (self.best_bid(), self.best_ask()),
            (Some((bid, _)), Some((ask, _))) if bid >= ask
        )
    }

    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    /// Bids best-first (descending price).
    pub fn bids(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bids
            .iter()
            .rev()
            .map(|(&ticks, &size)| (to_price(ticks), size))
    }

    /// Asks best-first (ascending price).
    pub fn asks(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.asks
            .iter()
            .map(|(&ticks, &size)| (to_price(ticks), size))
    }

    fn side_mut(&mut self, side: BookSide) -> &mut BTreeMap<i64, f64> {
        match side {
            BookSide::Bid => &mut self.bids,
            BookSide::Ask => &mut self.asks,
        }
    }
}
