//! Generic relay engine: socket lifecycle, accept loop, maintenance tasks.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use codec::EnvelopeBuilder;
use tokio::net::UnixListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};
use types::{current_timestamp_ns, Domain, EnvelopeHeader, HeartbeatTlv, Source, TlvType};

use crate::config::RelayConfig;
use crate::connection::{handle_connection, ConnectionManager};
use crate::metrics::RelayMetrics;
use crate::sequence::SequenceTracker;
use crate::{RelayError, RelayResult};

/// Channel-specific identity plugged into the generic [`Relay`] engine.
pub trait RelayLogic: Send + Sync + 'static {
    /// Domain this relay serves.
    fn domain(&self) -> Domain;

    /// Whether a parsed envelope belongs on this channel. The default
    /// forwards exactly the relay's own domain.
    fn should_forward(&self, header: &EnvelopeHeader) -> bool {
        header.domain == self.domain() as u8
    }
}

/// State shared by the accept loop, every connection task, and the
/// maintenance tasks.
pub struct ChannelShared<L: RelayLogic> {
    pub(crate) logic: L,
    pub(crate) config: RelayConfig,
    pub(crate) manager: ConnectionManager,
    pub(crate) tracker: SequenceTracker,
    pub(crate) metrics: Arc<RelayMetrics>,
}

/// Unix socket broker for one channel.
///
/// Owns the listener and the background heartbeat and metrics tasks. The
/// socket file is removed again when the relay is dropped.
pub struct Relay<L: RelayLogic> {
    shared: Arc<ChannelShared<L>>,
    listener: Option<UnixListener>,
    tasks: Vec<JoinHandle<()>>,
}

impl<L: RelayLogic> Relay<L> {
    pub fn new(logic: L, config: RelayConfig) -> Self {
        let manager = ConnectionManager::new(config.consumers.queue_capacity);
        Self {
            shared: Arc::new(ChannelShared {
                logic,
                config,
                manager,
                tracker: SequenceTracker::new(),
                metrics: Arc::new(RelayMetrics::new()),
            }),
            listener: None,
            tasks: Vec::new(),
        }
    }

    /// Handle to the channel counters, usable while the relay runs.
    pub fn metrics(&self) -> Arc<RelayMetrics> {
        Arc::clone(&self.shared.metrics)
    }

    pub fn socket_path(&self) -> &Path {
        &self.shared.config.transport.socket_path
    }

    /// Bind the channel socket, clearing any stale socket file first.
    pub fn bind(&mut self) -> RelayResult<()> {
        let path = &self.shared.config.transport.socket_path;
        prepare_socket(path)?;
        let listener = UnixListener::bind(path)
            .map_err(|e| RelayError::Setup(format!("failed to bind {}: {e}", path.display())))?;
        info!(
            relay = %self.shared.config.relay.name,
            path = %path.display(),
            domain = self.shared.logic.domain() as u8,
            "🚀 relay listening"
        );
        self.listener = Some(listener);
        Ok(())
    }

    /// Accept connections until the future is dropped. Binds first if
    /// [`bind`](Self::bind) has not been called yet.
    pub async fn run(mut self) -> RelayResult<()> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => return Err(RelayError::Setup("relay has no listener".into())),
        };
        self.spawn_maintenance();

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let active = self.shared.manager.connection_count();
                    if active >= self.shared.config.consumers.max_connections {
                        self.shared.metrics.record_refusal();
                        warn!(
                            active,
                            limit = self.shared.config.consumers.max_connections,
                            "connection limit reached, refusing peer"
                        );
                        continue;
                    }
                    let connection_id = self.shared.manager.register();
                    self.shared.metrics.record_accept();
                    info!(connection_id, active = active + 1, "accepted connection");
                    tokio::spawn(handle_connection(
                        stream,
                        connection_id,
                        Arc::clone(&self.shared),
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                }
            }
        }
    }

    fn spawn_maintenance(&mut self) {
        let shared = Arc::clone(&self.shared);
        self.tasks.push(tokio::spawn(run_heartbeat_task(shared)));
        let shared = Arc::clone(&self.shared);
        self.tasks.push(tokio::spawn(run_metrics_task(shared)));
    }
}

impl<L: RelayLogic> Drop for Relay<L> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        let path = &self.shared.config.transport.socket_path;
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Create the socket directory and remove a stale socket file left behind
/// by a previous run.
fn prepare_socket(path: &Path) -> RelayResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            RelayError::Setup(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| {
            RelayError::Setup(format!(
                "failed to remove stale socket {}: {e}",
                path.display()
            ))
        })?;
        debug!(path = %path.display(), "removed stale socket file");
    }
    Ok(())
}

/// Emit the broker's own heartbeat so consumers can tell a quiet channel
/// from a dead relay. `last_sequence` carries the forwarded-envelope count,
/// which lets a consumer estimate what it missed while disconnected.
async fn run_heartbeat_task<L: RelayLogic>(shared: Arc<ChannelShared<L>>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(
        shared.config.maintenance.heartbeat_interval_ms,
    ));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; consume it so the interval
    // starts counting from relay startup.
    ticker.tick().await;
    let mut sequence = 0u64;

    loop {
        ticker.tick().await;
        let beat = HeartbeatTlv {
            timestamp_ns: current_timestamp_ns(),
            last_sequence: shared.metrics.envelopes_forwarded(),
        };
        let envelope = match EnvelopeBuilder::new(Domain::Control, Source::Relay)
            .with_sequence(sequence)
            .add_tlv(TlvType::Heartbeat, &beat)
            .build()
        {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "failed to encode heartbeat");
                continue;
            }
        };
        sequence += 1;
        let receivers = shared.manager.broadcast(Bytes::from(envelope));
        shared.metrics.record_heartbeat();
        trace!(receivers, sequence, "heartbeat");
    }
}

/// Periodic one-line summary of the channel counters.
async fn run_metrics_task<L: RelayLogic>(shared: Arc<ChannelShared<L>>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(
        shared.config.maintenance.metrics_interval_secs,
    ));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        info!(
            relay = %shared.config.relay.name,
            active = shared.manager.connection_count(),
            publishers = shared.tracker.publishers(),
            "📊 {}",
            shared.metrics
        );
    }
}
