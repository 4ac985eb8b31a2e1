//! Health Webhook Relay - Main Entry Point

use tracing::{error, info};
use webhook_relay::{init_logging, run_server, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Health Webhook Relay v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    run_server(settings).await
}
