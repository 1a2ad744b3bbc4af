//! Watch command implementation.

use crate::config::AppConfig;
use hardlinker_api::SyncthingClient;
use hardlinker_engine::{check_connection, EventConsumer};
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Runs the watch command until Ctrl+C or SIGTERM.
pub async fn run(config: &AppConfig, since: u64) -> Result<(), Box<dyn std::error::Error>> {
    let client = SyncthingClient::new(&config.client_config()?)?;
    check_connection(&client).await?;

    info!(
        source = ?config.source,
        destination = ?config.destination,
        excludes = config.excludes.as_str(),
        "Starting hardlink mirror"
    );

    let consumer = EventConsumer::new(config.consumer_config(), Arc::new(client), config.pipeline())
        .with_start_cursor(since);

    let cancel = CancellationToken::new();
    let signals = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    let stats = consumer.run(cancel).await;
    signals.abort();

    info!(
        cursor = consumer.cursor(),
        batches = stats.batches,
        events = stats.events_received,
        linked = stats.tally.linked,
        already_present = stats.tally.already_present,
        rejected = stats.tally.rejected,
        failed = stats.tally.failed,
        "Shutdown complete"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
