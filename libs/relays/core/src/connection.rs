//! Per-connection plumbing: fan-out state and the read/write task pair.
//!
//! Every accepted connection is bidirectional. The read half feeds a
//! [`FrameDecoder`] so producers may write envelopes in arbitrary chunks;
//! the write half drains the relay's broadcast channel so the same peer can
//! act as a consumer. Either half ending tears the connection down.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use codec::{Frame, FrameDecoder};
use dashmap::DashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::config::DropPolicy;
use crate::engine::{ChannelShared, RelayLogic};
use crate::sequence::SequenceCheck;

/// Bytes read from a peer socket per syscall.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Tracks live connections and owns the broadcast channel they share.
#[derive(Debug)]
pub struct ConnectionManager {
    sender: broadcast::Sender<Bytes>,
    next_id: AtomicU64,
    active: DashMap<u64, Instant>,
}

impl ConnectionManager {
    pub fn new(queue_capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(queue_capacity);
        Self {
            sender,
            next_id: AtomicU64::new(1),
            active: DashMap::new(),
        }
    }

    /// Queue one envelope for every connected consumer. Returns how many
    /// consumers it reached; zero when nobody is subscribed, which is not
    /// an error.
    pub fn broadcast(&self, frame: Bytes) -> usize {
        self.sender.send(frame).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Bytes> {
        self.sender.subscribe()
    }

    /// Allocate a connection id and mark it live.
    pub fn register(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.active.insert(id, Instant::now());
        id
    }

    /// Refresh the last-activity stamp for a connection.
    pub fn touch(&self, id: u64) {
        if let Some(mut last_seen) = self.active.get_mut(&id) {
            *last_seen = Instant::now();
        }
    }

    pub fn deregister(&self, id: u64) {
        self.active.remove(&id);
    }

    pub fn connection_count(&self) -> usize {
        self.active.len()
    }
}

/// Drive one accepted connection until either direction ends.
pub(crate) async fn handle_connection<L: RelayLogic>(
    stream: UnixStream,
    connection_id: u64,
    shared: Arc<ChannelShared<L>>,
) {
    let (read_half, write_half) = stream.into_split();
    let consumer_rx = shared.manager.subscribe();

    let read_shared = Arc::clone(&shared);
    let mut read_task =
        tokio::spawn(async move { run_read_task(read_half, connection_id, read_shared).await });

    let write_shared = Arc::clone(&shared);
    let mut write_task = tokio::spawn(async move {
        run_write_task(write_half, connection_id, consumer_rx, write_shared).await
    });

    tokio::select! {
        _ = &mut read_task => write_task.abort(),
        _ = &mut write_task => read_task.abort(),
    }

    shared.manager.deregister(connection_id);
    debug!(
        connection_id,
        active = shared.manager.connection_count(),
        "connection closed"
    );
}

/// Reassemble envelopes out of the peer's byte stream and forward the ones
/// that belong on this channel.
async fn run_read_task<L: RelayLogic>(
    mut reader: OwnedReadHalf,
    connection_id: u64,
    shared: Arc<ChannelShared<L>>,
) {
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut decoder = if shared.config.validation.verify_checksums {
        FrameDecoder::new()
    } else {
        FrameDecoder::without_checksum_verification()
    };
    let idle_timeout = Duration::from_secs(shared.config.consumers.idle_timeout_secs);
    let mut skipped_seen = 0u64;
    let mut checksum_seen = 0u64;

    loop {
        let n = match timeout(idle_timeout, reader.read(&mut buf)).await {
            Ok(Ok(0)) => {
                debug!(connection_id, "peer closed connection");
                break;
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                debug!(connection_id, error = %e, "read failed");
                break;
            }
            Err(_) => {
                warn!(
                    connection_id,
                    timeout_secs = idle_timeout.as_secs(),
                    "peer idle past timeout, treating as dead"
                );
                break;
            }
        };

        shared.manager.touch(connection_id);
        decoder.extend(&buf[..n]);
        while let Some(frame) = decoder.next_frame() {
            forward_frame(&frame, connection_id, &shared);
        }

        // Decoder counters are cumulative across the connection; fold only
        // the newly accrued portion into the channel metrics.
        let skipped = decoder.skipped_bytes();
        if skipped > skipped_seen {
            warn!(
                connection_id,
                bytes = skipped - skipped_seen,
                "discarded bytes while resynchronizing stream"
            );
            shared.metrics.add_bytes_skipped(skipped - skipped_seen);
            skipped_seen = skipped;
        }
        let checksum_drops = decoder.checksum_drops();
        if checksum_drops > checksum_seen {
            warn!(
                connection_id,
                dropped = checksum_drops - checksum_seen,
                "dropped envelopes with bad payload checksum"
            );
            shared
                .metrics
                .add_checksum_drops(checksum_drops - checksum_seen);
            checksum_seen = checksum_drops;
        }
    }
}

/// Validate continuity, filter by domain, and broadcast one decoded frame.
fn forward_frame<L: RelayLogic>(frame: &Frame, connection_id: u64, shared: &ChannelShared<L>) {
    let header = &frame.header;

    if shared.config.validation.track_sequences {
        match shared
            .tracker
            .observe(header.domain, header.source, header.sequence)
        {
            SequenceCheck::Ok => {}
            SequenceCheck::Gap { expected, got } => {
                shared.metrics.record_gap();
                warn!(
                    domain = header.domain,
                    source = header.source,
                    expected,
                    got,
                    "sequence gap"
                );
            }
            SequenceCheck::OutOfOrder { expected, got } => {
                shared.metrics.record_out_of_order();
                warn!(
                    domain = header.domain,
                    source = header.source,
                    expected,
                    got,
                    "sequence ran backwards, publisher restart assumed"
                );
            }
        }
    }

    if !shared.logic.should_forward(header) {
        trace!(
            connection_id,
            domain = header.domain,
            "envelope outside relay domain, not forwarded"
        );
        return;
    }

    let len = frame.bytes.len();
    let receivers = shared.manager.broadcast(frame.bytes.clone());
    shared.metrics.record_forward(len);
    trace!(
        connection_id,
        sequence = header.sequence,
        bytes = len,
        receivers,
        "forwarded envelope"
    );
}

/// Drain the broadcast channel into the peer socket.
async fn run_write_task<L: RelayLogic>(
    mut writer: OwnedWriteHalf,
    connection_id: u64,
    mut consumer_rx: broadcast::Receiver<Bytes>,
    shared: Arc<ChannelShared<L>>,
) {
    loop {
        match consumer_rx.recv().await {
            Ok(frame) => {
                if let Err(e) = writer.write_all(&frame).await {
                    debug!(connection_id, error = %e, "write failed, consumer gone");
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                shared.metrics.add_lagged_drops(missed);
                match shared.config.consumers.drop_policy {
                    DropPolicy::DropOldest => {
                        warn!(
                            connection_id,
                            missed, "consumer lagged, oldest envelopes dropped"
                        );
                    }
                    DropPolicy::Disconnect => {
                        shared.metrics.record_policy_disconnect();
                        warn!(connection_id, missed, "consumer lagged, disconnecting");
                        break;
                    }
                }
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
