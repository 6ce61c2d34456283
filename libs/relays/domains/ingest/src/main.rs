//! Per-venue ingest relay binary.
//!
//! `ingest_relay --venue kraken` serves `/tmp/tickbus/ingest/kraken.sock`.
//! A `--config` file overrides the derived defaults, including the socket
//! path; the venue still names the instance in logs.

use anyhow::Result;
use clap::Parser;
use relay_core::{Relay, RelayConfig};
use relay_ingest::IngestLogic;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ingest_relay")]
#[command(about = "Tickbus per-venue ingest relay")]
#[command(version)]
struct Args {
    /// Venue this instance serves, e.g. "kraken" or "coinbase".
    #[arg(short, long)]
    venue: String,

    /// Path to a TOML configuration file. Venue-derived defaults apply
    /// when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit JSON-formatted logs
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let config = match &args.config {
        Some(path) => RelayConfig::from_file(path)?,
        None => RelayConfig::ingest_defaults(&args.venue),
    };
    info!(
        venue = %args.venue,
        socket = %config.transport.socket_path.display(),
        "starting ingest relay"
    );

    let mut relay = Relay::new(IngestLogic::new(&args.venue), config);
    relay.bind()?;

    tokio::select! {
        result = relay.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }
    Ok(())
}

fn init_logging(args: &Args) {
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };
    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(log_level)
            .init();
    } else {
        tracing_subscriber::fmt().with_max_level(log_level).init();
    }
}
