//! Graceful shutdown controller.
//!
//! Listens for SIGINT/SIGTERM and flips a `tokio::sync::watch` flag that
//! every subsystem can await. The flag is sticky: a subscriber created after
//! shutdown was triggered still observes it.

use tokio::signal;
use tokio::sync::watch;

pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    /// A future that resolves once shutdown has been triggered.
    pub fn signalled(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        async move {
            // Err means the controller was dropped, which also ends the wait.
            let _ = rx.wait_for(|stopped| *stopped).await;
        }
    }

    /// Wait for SIGTERM or SIGINT, then trigger shutdown.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
            _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
            _ = self.signalled() => {}
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn programmatic_shutdown_resolves_waiters() {
        let controller = ShutdownController::new();
        let waiter = controller.signalled();
        controller.shutdown();
        waiter.await;
        assert!(controller.is_shutdown());
    }

    #[tokio::test]
    async fn late_subscribers_see_shutdown() {
        let controller = ShutdownController::new();
        controller.shutdown();
        controller.signalled().await;
        assert!(*controller.subscribe().borrow());
    }
}
