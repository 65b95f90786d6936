//! chat-relay server entry point.
//!
//! Starts the hub and the Axum HTTP server with the WebSocket and health
//! endpoints. `Ctrl+C` stops both.

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use chat_relay::api;
use chat_relay::app_state::AppState;
use chat_relay::config::RelayConfig;
use chat_relay::hub::Hub;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RelayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting chat-relay");

    // Start the hub
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let (hub, hub_task) = Hub::spawn(config.hub_settings(), async move {
        let _ = stop_rx.wait_for(|stop| *stop).await;
    });

    // Build application state
    let app_state = AppState {
        hub,
        session: config.session_policy(),
        pump: config.pump_settings(),
    };
    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = stop_tx.send(true);
        })
        .await?;

    hub_task.await?;
    tracing::info!("chat-relay stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
