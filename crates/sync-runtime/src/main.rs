//! `image-sync` entry point.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use sync_runtime::{load_config, Args, SyncRuntime};
use sync_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if args.json_logs {
        telemetry.json_logs = true;
    }
    init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = load_config(&args).context("Invalid configuration")?;

    let mut runtime = SyncRuntime::new(config);
    runtime.start().await.context("Startup failed")?;

    info!("Watching for images. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;

    Ok(())
}
