//! Shared fixtures for the end-to-end scenarios under `tests/`.
//!
//! Every scenario spins up a real relay on a temporary socket and talks to
//! it over plain `UnixStream`s, exactly as a production producer or consumer
//! would. Nothing here reaches into relay internals; assertions ride on the
//! wire bytes and the relay's public metrics handle.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use codec::{EnvelopeBuilder, Frame, FrameDecoder};
use relay_core::{Relay, RelayConfig, RelayLogic, RelayMetrics, RelayResult};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::net::UnixStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use types::{ArbSignalTlv, BookDeltaTlv, BookLevel, Domain, Source, TlvType, TradeSide, TradeTlv};

/// Generous ceiling for any single wait inside a scenario.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A relay running on its own temporary socket, torn down on drop.
pub struct RunningRelay {
    pub path: PathBuf,
    pub metrics: Arc<RelayMetrics>,
    handle: JoinHandle<RelayResult<()>>,
    _dir: TempDir,
}

impl Drop for RunningRelay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn a relay with the given logic and config on a fresh socket.
///
/// Heartbeats are pushed beyond the test horizon so byte-stream assertions
/// see only what the producers send.
pub async fn start_relay<L: RelayLogic>(logic: L, mut config: RelayConfig) -> RunningRelay {
    let dir = TempDir::new().unwrap();
    config.transport.socket_path = dir.path().join("relay.sock");
    config.consumers.idle_timeout_secs = 120;
    config.maintenance.heartbeat_interval_ms = 60_000;

    let mut relay = Relay::new(logic, config);
    relay.bind().unwrap();
    let metrics = relay.metrics();
    let path = relay.socket_path().to_path_buf();
    let handle = tokio::spawn(relay.run());
    RunningRelay {
        path,
        metrics,
        handle,
        _dir: dir,
    }
}

/// Connect to the relay and give it a beat to register the connection, so
/// envelopes sent afterwards are guaranteed to reach this subscriber.
pub async fn connect_settled(relay: &RunningRelay) -> UnixStream {
    let stream = UnixStream::connect(&relay.path).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    stream
}

pub fn trade_envelope(source: Source, sequence: u64, symbol_hash: u64, price: f64) -> Vec<u8> {
    let trade = TradeTlv::new(
        symbol_hash,
        price,
        0.25,
        1_700_000_000_000_000_000 + sequence,
        TradeSide::Buy,
    );
    EnvelopeBuilder::new(Domain::MarketData, source)
        .with_sequence(sequence)
        .add_tlv(TlvType::Trade, &trade)
        .build()
        .unwrap()
}

pub fn mapping_envelope(sequence: u64, hash: u64, canonical: &str) -> Vec<u8> {
    EnvelopeBuilder::new(Domain::MarketData, Source::KrakenCollector)
        .with_sequence(sequence)
        .add_tlv_slice(
            TlvType::SymbolMapping,
            &codec::encode_symbol_mapping(hash, canonical),
        )
        .build()
        .unwrap()
}

pub fn snapshot_envelope(
    sequence: u64,
    hash: u64,
    book_sequence: u64,
    bids: &[BookLevel],
    asks: &[BookLevel],
) -> Vec<u8> {
    EnvelopeBuilder::new(Domain::MarketData, Source::KrakenCollector)
        .with_sequence(sequence)
        .add_tlv_slice(
            TlvType::BookSnapshot,
            &codec::encode_book_snapshot(hash, book_sequence, bids, asks),
        )
        .build()
        .unwrap()
}

pub fn signal_envelope(sequence: u64, signal_id: u64) -> Vec<u8> {
    let signal = ArbSignalTlv {
        signal_id,
        symbol_hash: 0xB007,
        buy_venue: symbols::hash_symbol("kraken"),
        sell_venue: symbols::hash_symbol("coinbase"),
        expected_profit: 4.2,
        confidence: 0.9,
    };
    EnvelopeBuilder::new(Domain::Signal, Source::ArbStrategy)
        .with_sequence(sequence)
        .add_tlv(TlvType::ArbSignal, &signal)
        .build()
        .unwrap()
}

pub fn delta_envelope(sequence: u64, delta: &BookDeltaTlv) -> Vec<u8> {
    EnvelopeBuilder::new(Domain::MarketData, Source::KrakenCollector)
        .with_sequence(sequence)
        .add_tlv(TlvType::BookDelta, delta)
        .build()
        .unwrap()
}

/// Read until `count` complete envelopes have been decoded.
pub async fn read_frames(stream: &mut UnixStream, count: usize) -> Vec<Frame> {
    let mut decoder = FrameDecoder::new();
    let mut frames = Vec::new();
    let mut buf = vec![0u8; 4096];
    while frames.len() < count {
        let n = timeout(TEST_TIMEOUT, stream.read(&mut buf))
            .await
            .expect("timed out waiting for envelopes")
            .expect("read failed");
        if n == 0 {
            panic!("peer closed after {} of {count} envelopes", frames.len());
        }
        decoder.extend(&buf[..n]);
        while let Some(frame) = decoder.next_frame() {
            frames.push(frame);
        }
    }
    frames
}

/// Read exactly `len` raw bytes off the socket.
pub async fn read_bytes(stream: &mut UnixStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    timeout(TEST_TIMEOUT, stream.read_exact(&mut buf))
        .await
        .expect("timed out waiting for bytes")
        .expect("read failed");
    buf
}

/// Opt-in log output for debugging a failing scenario:
/// `RUST_LOG=debug cargo test -p tickbus-e2e-tests`.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
