//! sitewatchd — the sitewatch daemon.
//!
//! Polls the configured HTTP(S) targets every `interval_seconds`, tracks
//! each target's up/down state, and posts DOWN / RECOVERED alerts to a
//! Telegram chat. The config file is re-read before every cycle.
//!
//! # Usage
//!
//! ```text
//! sitewatchd --config /etc/sitewatch/config.json
//! sitewatchd --config config.toml --log-format json
//! sitewatchd --once          # single cycle, then exit
//! ```

mod service;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::error;

#[derive(Parser)]
#[command(name = "sitewatchd", about = "HTTP availability monitor with Telegram alerts")]
struct Cli {
    /// Config file (.json, or .toml).
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Run a single check cycle and exit.
    #[arg(long)]
    once: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    if let Err(e) = service::run_service(cli.config, cli.once).await {
        error!(error = ?e, "service crashed");
        return Err(e);
    }
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
