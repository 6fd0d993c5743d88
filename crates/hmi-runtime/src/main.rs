//! # HMI Middleware
//!
//! Entry point for the middleware process. See the library docs for the
//! startup sequence.

use anyhow::{Context, Result};
use tracing::{error, info};

use hmi_runtime::{MiddlewareRuntime, RuntimeConfig};
use hmi_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry_config = TelemetryConfig::from_env();
    let _telemetry = init_telemetry(&telemetry_config).context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env();
    info!(?config, "Configuration loaded");

    let mut runtime = MiddlewareRuntime::new(config)?;
    if let Err(e) = runtime.start().await {
        error!(error = %e, "Startup failed");
        return Err(e);
    }

    info!("Middleware is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
