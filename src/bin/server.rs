//! Agent designer HTTP server.
//!
//! Usage: `agent-designer [config.yaml]`

use anyhow::{anyhow, Context};
use tokio::net::TcpListener;
use tracing::info;

use agent_designer::api::{self, ApiState};
use agent_designer::config::get_settings;
use agent_designer::storage::{self, seed_demo_data};
use agent_designer::telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1);
    let settings = get_settings(config_path.as_deref()).context("loading settings")?;

    init_telemetry(TelemetryConfig::from(&settings.logger))
        .map_err(|e| anyhow!("failed to initialize telemetry: {}", e))?;

    let storage = storage::connect(&settings.storage)
        .await
        .context("opening storage")?;
    if settings.storage.seed_demo {
        seed_demo_data(storage.as_ref())
            .await
            .context("seeding demo data")?;
    }

    let state = ApiState::new(storage).with_run_completion(settings.simulation.run_completion());
    let app = api::router(state);

    let addr = settings.server.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
