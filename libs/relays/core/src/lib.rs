//! # Relay Core: Generic Channel Broker Engine
//!
//! ## Purpose
//!
//! Shared machinery for every Tickbus relay binary. A relay owns one Unix
//! domain socket, accepts any number of producer and consumer connections,
//! reassembles envelopes out of the producers' byte streams, and rebroadcasts
//! each valid envelope verbatim to every connected consumer. The channel
//! identity (market data, signals, per-venue ingest) lives in a small
//! [`RelayLogic`] implementation; everything else is identical across relays
//! and lives here.
//!
//! ## Integration Points
//!
//! - **Input**: producers connect over the channel socket and write
//!   wire-format envelopes; partial and concatenated writes are handled by a
//!   per-connection [`codec::FrameDecoder`].
//! - **Output**: consumers on the same socket receive the exact bytes the
//!   producer sent. The relay never re-encodes a message it forwards.
//! - **Filtering**: only envelopes whose header domain matches the relay's
//!   domain are forwarded. Everything else that parses cleanly still counts
//!   as peer liveness but goes no further.
//!
//! ## Architecture Role
//!
//! ```text
//! Producers ──> [ FrameDecoder ] ──> [ domain filter ] ──> broadcast ──> Consumers
//!                     │                      │                 │
//!                 resync/skip         SequenceTracker     lag policy
//! ```
//!
//! Fan-out rides a single `tokio::sync::broadcast` channel per relay. A slow
//! consumer either loses the oldest queued envelopes ([`DropPolicy::DropOldest`])
//! or is disconnected ([`DropPolicy::Disconnect`]); it can never apply
//! backpressure to producers or to other consumers.

pub mod config;
pub mod connection;
pub mod engine;
pub mod metrics;
pub mod sequence;

pub use config::{DropPolicy, RelayConfig};
pub use connection::ConnectionManager;
pub use engine::{Relay, RelayLogic};
pub use metrics::RelayMetrics;
pub use sequence::{SequenceCheck, SequenceTracker};

use thiserror::Error;

/// Errors surfaced by relay setup and operation.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("socket setup failed: {0}")]
    Setup(String),

    #[error("codec error: {0}")]
    Codec(#[from] codec::CodecError),

    #[error("protocol error: {0}")]
    Protocol(#[from] types::ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the relay crates.
pub type RelayResult<T> = Result<T, RelayError>;
