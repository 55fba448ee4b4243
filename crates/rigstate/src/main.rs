//! rigstate daemon
//!
//! Serves the hardware inventory of this machine over HTTP and keeps its
//! sensor readings fresh in the background.

use std::sync::Arc;

use color_eyre::Result;
use rigstate_inventory::{Collaborators, InventoryScanner};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod router;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let source = Config::locate();
    let config = match &source {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    init_tracing(&config);

    match &source {
        Some(path) => info!(path = %path.display(), "loaded config"),
        None => warn!("no config file found, using defaults"),
    }

    let io = Collaborators::local().with_timeout(config.inventory.command_timeout());
    let scanner = InventoryScanner::new(io).with_quirks(config.quirks.table());
    let state = Arc::new(AppState::new(scanner));

    if config.inventory.scan_on_startup {
        match state.rescan().await {
            Ok(counts) => info!(
                cpus = counts.cpus,
                gpus = counts.gpus,
                drives = counts.drives,
                "initial scan complete"
            ),
            Err(e) => warn!(
                code = %e.error.code,
                error = %e.error.message,
                "initial scan failed, serving an empty inventory"
            ),
        }
    }

    if let Some(interval) = config.inventory.refresh_interval() {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = state.refresh().await {
                    warn!(error = %e.error.message, "telemetry refresh failed");
                }
            }
        });
    }

    let app = router::create_router(state);
    let listener = tokio::net::TcpListener::bind(&config.daemon.bind).await?;
    info!(bind = %config.daemon.bind, "rigstate daemon listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("rigstate daemon stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.daemon.log_level));

    if config.daemon.log_format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}
