//! Graceful Shutdown Handler
//!
//! Handles OS signals and releases every loaded map before the process exits.

use super::{MapStore, RuntimeManager};
use tokio::signal;

/// Releases the runtime manager's maps on SIGTERM / SIGINT
///
/// # Example
///
/// ```rust,ignore
/// use mapkeeper::lifecycle::ShutdownHandler;
///
/// let shutdown_handler = ShutdownHandler::new(manager.clone());
///
/// tokio::spawn(async move {
///     shutdown_handler.wait_for_shutdown().await;
///     std::process::exit(0);
/// });
/// ```
pub struct ShutdownHandler<S: MapStore> {
    manager: RuntimeManager<S>,
}

impl<S: MapStore> ShutdownHandler<S> {
    pub fn new(manager: RuntimeManager<S>) -> Self {
        Self { manager }
    }

    /// Wait for a shutdown signal, then shut the manager down
    pub async fn wait_for_shutdown(&self) {
        shutdown_signal().await;
        self.shutdown().await;
    }

    /// Shut the manager down without waiting for a signal
    pub async fn shutdown(&self) {
        tracing::info!("Starting graceful shutdown...");
        self.manager.shutdown().await;
        tracing::info!("Graceful shutdown complete");
    }
}

/// Create a future that completes when a shutdown signal is received
///
/// If a signal handler cannot be installed the corresponding branch never
/// completes; the error is logged.
///
/// # Example
///
/// ```rust,ignore
/// use mapkeeper::lifecycle::shutdown_signal;
///
/// tokio::select! {
///     _ = shutdown_signal() => {
///         println!("Shutdown signal received");
///     }
///     _ = server.serve() => {}
/// }
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeStore, manager_with};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_handler_releases_maps() {
        let store = Arc::new(FakeStore::default());
        let manager = manager_with(&store, &["office", "lobby"]);
        manager.ensure_started().await.unwrap();

        ShutdownHandler::new(manager.clone()).shutdown().await;

        assert!(!manager.is_running());
        assert_eq!(store.live_count(), 0);
    }
}
