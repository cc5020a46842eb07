//! bravia - display monitor
//!
//! Keeps a connection to one display open and logs every connectivity change
//! and notification until interrupted.

use bravia_client::{Client, Config};
use bravia_protocol::Notification;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration (from file if BRAVIA_CONFIG is set, then env overrides)
    let config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("BRAVIA_CONFIG") {
                tracing::info!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            // If a config file was explicitly specified, fail on error
            if std::env::var("BRAVIA_CONFIG").is_ok() {
                tracing::error!("Failed to load config: {}", e);
                return Err(e.into());
            }
            tracing::info!("Using default configuration");
            Config::default()
        }
    };

    let conn_config = config.connection();
    tracing::info!("Starting bravia monitor");
    tracing::info!("  Device: {}", conn_config.addr);
    tracing::info!("  Command timeout: {:?}", conn_config.command_timeout);
    tracing::info!("  Retry delay: {:?}", conn_config.retry_delay);

    let retry_delay = conn_config.retry_delay;
    let client = Client::new(conn_config);
    let mut notifications = client.subscribe();

    // The engine only redials on its own once the first dial succeeded
    loop {
        match client.connect().await {
            Ok(()) => break,
            Err(e) if e.is_retryable() => {
                tracing::warn!("{}; retrying in {:?}", e, retry_delay);
                tokio::select! {
                    _ = tokio::time::sleep(retry_delay) => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received shutdown signal before connecting");
                        return Ok(());
                    }
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    loop {
        tokio::select! {
            frame = notifications.recv() => {
                match frame {
                    Ok(frame) => match Notification::from_frame(&frame) {
                        Ok(Notification::Connection(true)) => tracing::info!("Device connected"),
                        Ok(Notification::Connection(false)) => tracing::warn!("Device disconnected"),
                        Ok(notification) => tracing::info!("Notification: {}", notification),
                        Err(e) => tracing::warn!("Undecodable notification {}: {}", frame, e),
                    },
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!("Dropped {} notifications", n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal, closing connection...");
                break;
            }
        }
    }

    client.close().await?;
    tracing::info!("Monitor stopped");
    Ok(())
}
