//! # Tracking Node
//!
//! Segment agent for change tracking.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments, install logging
//! 2. Load and validate the TOML configuration
//! 3. Attach the shared tracking region (allocated once)
//! 4. Run the registration worker until Ctrl+C, or one sweep with `--once`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use change_tracking::{
    JsonFileSettingsStore, MetricsSnapshot, RegistrationWorker, SegmentStatus, SharedRegion,
    SweepReport, TrackingConfig,
};
use shared_types::{Oid, SegmentIndex};

/// Change-tracking segment agent
#[derive(Parser, Debug)]
#[command(name = "tracking-node")]
#[command(about = "Boots change tracking on one segment and runs the registration worker")]
struct Args {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file holding per-database tracking settings
    #[arg(short, long, default_value = "tracking-settings.json")]
    settings: PathBuf,

    /// Override the configured segment index
    #[arg(long)]
    segment: Option<SegmentIndex>,

    /// Run a single sweep, print the status as JSON and exit
    #[arg(long)]
    once: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize)]
struct OnceReport {
    status: SegmentStatus,
    sweep: SweepReport,
    bound_databases: Vec<Oid>,
    /// Fraction of filter slots currently bound
    saturation: f64,
    tracking_error: bool,
    metrics: MetricsSnapshot,
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("invalid log filter")?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_config(args: &Args) -> Result<TrackingConfig> {
    let mut config = match &args.config {
        Some(path) => TrackingConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TrackingConfig::default(),
    };
    if let Some(segment) = args.segment {
        config.segment_index = segment;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;

    let config = load_config(&args)?;
    let region = SharedRegion::new("change-tracking");
    let shared = region
        .attach(&config)
        .context("allocating tracking region")?;

    let settings = Arc::new(JsonFileSettingsStore::new(&args.settings));
    let worker = RegistrationWorker::new(Arc::clone(&shared), settings);

    if args.once {
        let sweep = worker.status_check().await.context("registration sweep")?;
        let report = OnceReport {
            status: SegmentStatus {
                segment_index: shared.segment_index(),
                is_initialized: shared.is_initialized(),
            },
            sweep,
            bound_databases: shared.bloom_set().bound_owners(),
            saturation: shared.bloom_set().saturation(),
            tracking_error: shared.has_tracking_error(),
            metrics: shared.metrics().snapshot(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handle = worker.spawn(shutdown_rx);

    info!(segment = config.segment_index, "Tracking node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    shutdown_tx.send(true)?;
    handle.await.context("registration worker panicked")?;
    info!("Tracking node stopped");
    Ok(())
}
