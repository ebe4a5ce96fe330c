//! Telemetry Reporter - periodic usage counts upload
//!
//! Counts the host's entity tables on a fixed schedule, stages the counts
//! locally and posts them to the telemetry collector.
//!
//! # Usage
//! ```sh
//! TELEMETRY_CONSUMER_URL=https://collector.example.com/api/v1/telemetry cargo run
//! ```
//!
//! # Environment Variables
//! - `DATABASE_URL` - Store to count (default: sqlite://data/modeldb.db)
//! - `TELEMETRY_CONSUMER_URL` - Collector endpoint (required unless opted out)
//! - `TELEMETRY_OPT_OUT` - Disable the reporter entirely (default: false)
//! - `TELEMETRY_FREQUENCY_HOURS` - Hours between ticks (default: 1)

use anyhow::Result;
use clap::Parser;
use modeldb_telemetry::application::bootstrap::TelemetryBootstrap;
use modeldb_telemetry::application::telemetry::TelemetryScheduler;
use modeldb_telemetry::config::{Config, frequency_from_hours};
use tokio::sync::watch;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Usage telemetry reporter", long_about = None)]
struct Cli {
    /// Run a single tick and exit
    #[arg(long)]
    once: bool,

    /// Override TELEMETRY_FREQUENCY_HOURS
    #[arg(long)]
    frequency_hours: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();

    info!("Telemetry Reporter {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    if config.telemetry.opt_out {
        info!("Telemetry opted out (TELEMETRY_OPT_OUT=true). Nothing to do.");
        return Ok(());
    }

    let handle = TelemetryBootstrap::init(&config).await?;

    if cli.once {
        handle.reporter.run_tick().await;
        info!("Single tick complete. Exiting...");
        return Ok(());
    }

    let frequency = match cli.frequency_hours {
        Some(hours) => frequency_from_hours("--frequency-hours", hours)?,
        None => config.telemetry.frequency,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = TelemetryScheduler::new(handle.reporter.clone(), frequency);
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));

    info!("Reporter running. Press Ctrl+C to shutdown.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Waiting for current tick...");

    shutdown_tx.send(true).ok();
    scheduler_task.await?;
    handle.db.pool.close().await;

    Ok(())
}
