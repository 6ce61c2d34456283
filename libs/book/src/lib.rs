//! # Book: Order-Book Reconstruction
//!
//! ## Purpose
//!
//! Rebuilds per-symbol L2 order books from the snapshot and delta TLVs
//! carried over the market-data channel. Books are keyed purely by symbol
//! hash; canonical names enter the picture only at presentation time, via a
//! registry the caller passes in, so book state never depends on mapping
//! arrival.
//!
//! ## Architecture Role
//!
//! The [`Reconstructor`] is the per-consumer state machine: each hash is
//! `Uninitialized` until its first snapshot and `Live` after. Deltas that
//! race ahead of the snapshot are parked in a bounded FIFO and replayed in
//! arrival order the moment the snapshot lands, which is the normal join
//! sequence against a venue feed, not an error path. A `BookReset` control
//! message is the only way a live book returns to `Uninitialized`.
//!
//! Every event for a given hash must be processed by a single logical owner;
//! the `&mut self` API reflects that. Different hashes are independent, so
//! parallelism across symbols means one reconstructor per shard, not shared
//! mutation.

pub mod error;
pub mod order_book;
pub mod reconstructor;
pub mod view;

pub use error::BookError;
pub use order_book::OrderBook;
pub use reconstructor::{DeltaOutcome, Reconstructor, ReconstructorStats, DEFAULT_MAX_PENDING_DELTAS};
pub use view::BookView;
