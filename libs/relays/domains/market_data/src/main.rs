//! Market data relay binary.
//!
//! Serves `/tmp/tickbus/market_data.sock` with the channel defaults;
//! `--config` points at a TOML file to override them.

use anyhow::Result;
use clap::Parser;
use relay_core::{Relay, RelayConfig};
use relay_market_data::MarketDataLogic;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "market_data_relay")]
#[command(about = "Tickbus market data channel relay")]
#[command(version)]
struct Args {
    /// Path to a TOML configuration file. Channel defaults apply when omitted.
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
        None => RelayConfig::market_data_defaults(),
    };
    info!(
        relay = %config.relay.name,
        socket = %config.transport.socket_path.display(),
        "starting market data relay"
    );

    let mut relay = Relay::new(MarketDataLogic, config);
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
