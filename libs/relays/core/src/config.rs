//! Relay configuration.
//!
//! Each relay binary starts from the per-channel defaults below and may
//! override them with a TOML file. The file mirrors the struct layout:
//!
//! ```toml
//! [relay]
//! name = "market_data"
//!
//! [transport]
//! socket_path = "/tmp/tickbus/market_data.sock"
//!
//! [validation]
//! verify_checksums = true
//! track_sequences = true
//!
//! [consumers]
//! queue_capacity = 10000
//! drop_policy = "drop_oldest"
//! max_connections = 256
//! idle_timeout_secs = 30
//!
//! [maintenance]
//! heartbeat_interval_ms = 1000
//! metrics_interval_secs = 30
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use types::{INGEST_SOCKET_DIR, MARKET_DATA_SOCKET, SIGNAL_SOCKET};

use crate::{RelayError, RelayResult};

/// What to do with a consumer that cannot keep up with the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Silently drop the oldest queued envelopes and keep the consumer
    /// connected. The consumer observes a sequence gap.
    DropOldest,
    /// Disconnect the consumer so it can reconnect and resubscribe from the
    /// live stream. Nothing is ever replayed either way.
    Disconnect,
}

/// Complete configuration for one relay instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub relay: RelaySettings,
    pub transport: TransportConfig,
    pub validation: ValidationPolicy,
    pub consumers: ConsumerPolicy,
    pub maintenance: MaintenancePolicy,
}

/// Identity of the relay, used in logs and metrics output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Unix domain socket the relay binds. The parent directory is created
    /// on startup and a stale socket file from a previous run is removed.
    pub socket_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Recompute CRC32 over each framed payload. Envelopes that fail are
    /// dropped whole and surface downstream as sequence gaps.
    pub verify_checksums: bool,
    /// Track per-(domain, source) sequence continuity and log gaps.
    pub track_sequences: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerPolicy {
    /// Envelopes buffered per consumer before the drop policy applies.
    pub queue_capacity: usize,
    pub drop_policy: DropPolicy,
    /// Connections beyond this limit are refused at accept time.
    pub max_connections: usize,
    /// A peer that sends nothing for this long is treated as dead. Producers
    /// and long-lived consumers stay alive by sending heartbeats.
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenancePolicy {
    /// Interval between broker heartbeats on the channel.
    pub heartbeat_interval_ms: u64,
    /// Interval between metrics summary log lines.
    pub metrics_interval_secs: u64,
}

impl RelayConfig {
    /// Defaults for the market data channel: highest volume, lossy under
    /// consumer lag.
    pub fn market_data_defaults() -> Self {
        Self {
            relay: RelaySettings {
                name: "market_data".to_string(),
            },
            transport: TransportConfig {
                socket_path: PathBuf::from(MARKET_DATA_SOCKET),
            },
            validation: ValidationPolicy {
                verify_checksums: true,
                track_sequences: true,
            },
            consumers: ConsumerPolicy {
                queue_capacity: 10_000,
                drop_policy: DropPolicy::DropOldest,
                max_connections: 256,
                idle_timeout_secs: 30,
            },
            maintenance: MaintenancePolicy {
                heartbeat_interval_ms: 1_000,
                metrics_interval_secs: 30,
            },
        }
    }

    /// Defaults for the signal channel: lower volume, and a lagging consumer
    /// is disconnected rather than silently skipped past trading signals.
    pub fn signal_defaults() -> Self {
        Self {
            relay: RelaySettings {
                name: "signal".to_string(),
            },
            transport: TransportConfig {
                socket_path: PathBuf::from(SIGNAL_SOCKET),
            },
            validation: ValidationPolicy {
                verify_checksums: true,
                track_sequences: true,
            },
            consumers: ConsumerPolicy {
                queue_capacity: 1_000,
                drop_policy: DropPolicy::Disconnect,
                max_connections: 64,
                idle_timeout_secs: 30,
            },
            maintenance: MaintenancePolicy {
                heartbeat_interval_ms: 1_000,
                metrics_interval_secs: 30,
            },
        }
    }

    /// Defaults for a per-venue ingest relay. The socket path is derived from
    /// the venue name: `/tmp/tickbus/ingest/<venue>.sock`.
    pub fn ingest_defaults(venue: &str) -> Self {
        Self {
            relay: RelaySettings {
                name: format!("ingest-{venue}"),
            },
            transport: TransportConfig {
                socket_path: PathBuf::from(INGEST_SOCKET_DIR).join(format!("{venue}.sock")),
            },
            validation: ValidationPolicy {
                verify_checksums: true,
                track_sequences: true,
            },
            consumers: ConsumerPolicy {
                queue_capacity: 4_000,
                drop_policy: DropPolicy::DropOldest,
                max_connections: 32,
                idle_timeout_secs: 30,
            },
            maintenance: MaintenancePolicy {
                heartbeat_interval_ms: 1_000,
                metrics_interval_secs: 30,
            },
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> RelayResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| {
            RelayError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot work.
    pub fn validate(&self) -> RelayResult<()> {
        if self.relay.name.is_empty() {
            return Err(RelayError::Config("relay name must not be empty".into()));
        }
        if self.transport.socket_path.as_os_str().is_empty() {
            return Err(RelayError::Config("socket_path must not be empty".into()));
        }
        if self.consumers.queue_capacity < 16 {
            return Err(RelayError::Config(format!(
                "queue_capacity {} is too small (minimum 16)",
                self.consumers.queue_capacity
            )));
        }
        if self.consumers.max_connections == 0 {
            return Err(RelayError::Config("max_connections must be at least 1".into()));
        }
        if self.consumers.idle_timeout_secs == 0 {
            return Err(RelayError::Config("idle_timeout_secs must be at least 1".into()));
        }
        if self.maintenance.heartbeat_interval_ms == 0 {
            return Err(RelayError::Config("heartbeat_interval_ms must be at least 1".into()));
        }
        // Peers rely on broker heartbeats to detect liveness; a heartbeat
        // slower than the idle timeout would let healthy peers expire.
        if self.maintenance.heartbeat_interval_ms >= self.consumers.idle_timeout_secs * 1_000 {
            return Err(RelayError::Config(format!(
                "heartbeat_interval_ms {} must be shorter than idle_timeout_secs {}",
                self.maintenance.heartbeat_interval_ms, self.consumers.idle_timeout_secs
            )));
        }
        if self.maintenance.metrics_interval_secs == 0 {
            return Err(RelayError::Config("metrics_interval_secs must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_defaults_validate() {
        RelayConfig::market_data_defaults().validate().unwrap();
        RelayConfig::signal_defaults().validate().unwrap();
        RelayConfig::ingest_defaults("kraken").validate().unwrap();
    }

    #[test]
    fn test_ingest_socket_derived_from_venue() {
        let config = RelayConfig::ingest_defaults("coinbase");
        assert_eq!(
            config.transport.socket_path,
            PathBuf::from("/tmp/tickbus/ingest/coinbase.sock")
        );
        assert_eq!(config.relay.name, "ingest-coinbase");
    }

    #[test]
    fn test_parse_toml_overrides() {
        let raw = r#"
            [relay]
            name = "market_data"

            [transport]
            socket_path = "/run/tickbus/md.sock"

            [validation]
            verify_checksums = false
            track_sequences = true

            [consumers]
            queue_capacity = 64
            drop_policy = "disconnect"
            max_connections = 8
            idle_timeout_secs = 10

            [maintenance]
            heartbeat_interval_ms = 500
            metrics_interval_secs = 5
        "#;
        let config: RelayConfig = toml::from_str(raw).unwrap();
        config.validate().unwrap();
        assert_eq!(config.transport.socket_path, PathBuf::from("/run/tickbus/md.sock"));
        assert!(!config.validation.verify_checksums);
        assert_eq!(config.consumers.drop_policy, DropPolicy::Disconnect);
        assert_eq!(config.consumers.queue_capacity, 64);
    }

    #[test]
    fn test_validate_rejects_tiny_queue() {
        let mut config = RelayConfig::market_data_defaults();
        config.consumers.queue_capacity = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_slow_heartbeat() {
        let mut config = RelayConfig::market_data_defaults();
        config.maintenance.heartbeat_interval_ms = 60_000;
        config.consumers.idle_timeout_secs = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("relay.toml");
        let config = RelayConfig::signal_defaults();
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = RelayConfig::from_file(&path).unwrap();
        assert_eq!(loaded.relay.name, "signal");
        assert_eq!(loaded.consumers.drop_policy, DropPolicy::Disconnect);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = RelayConfig::from_file("/nonexistent/relay.toml").unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }
}
