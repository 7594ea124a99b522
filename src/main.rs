//! signal-relay - Main entry point
//!
//! Serves the room endpoints and the signaling WebSocket.

mod args;

use args::Args;
use clap::Parser;
use log::{error, info, warn};
use signal_relay::web::{self, SharedState};
use signal_relay::Config;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;
use tokio::task;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args = Args::parse();

    let loaded = args.load_config();
    let mut config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => Config::default(),
    };
    args.apply_overrides(&mut config);

    // Initialize logging
    env_logger::Builder::new()
        .parse_filters(&std::env::var("SIGNAL_RELAY_LOG").unwrap_or_else(|_| config.logging.level.clone()))
        .init();

    info!("signal-relay v{}", env!("CARGO_PKG_VERSION"));
    match loaded {
        Ok(_) => info!("Loaded configuration from {:?}", args.config),
        Err(e) => warn!("Failed to load config: {}, using defaults", e),
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e);
    }

    let state = Arc::new(SharedState::new(config));

    // Start HTTP server
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let http_server = web::run_http_server(state.clone(), async move {
        let _ = stop_rx.await;
    });

    let mut http_handle = task::spawn(async move {
        if let Err(e) = http_server.await {
            error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal
    let shutdown = async {
        let _ = signal::ctrl_c().await;
        info!("Shutdown signal received");
    };

    tokio::select! {
        _ = shutdown => {
            info!("Initiating graceful shutdown...");
        }
        result = &mut http_handle => {
            if let Err(e) = result {
                error!("HTTP server join error: {}", e);
            }
            warn!("HTTP server stopped unexpectedly");
            return Ok(());
        }
    }

    let _ = stop_tx.send(());
    if let Err(e) = http_handle.await {
        error!("HTTP server join error: {}", e);
    }

    info!(
        "signal-relay stopped ({} rooms open at shutdown)",
        state.registry.room_count()
    );

    Ok(())
}
