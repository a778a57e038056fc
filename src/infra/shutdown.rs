//! Graceful shutdown signaling.
//!
//! Background tasks hold a `ShutdownSignal`; the server holds the
//! `ShutdownController` and triggers it on SIGTERM/SIGINT so every
//! periodic task stops with the process instead of running fire-and-forget.

use tokio::signal;
use tokio::sync::watch;
use tracing::info;

/// Sender half: owned by the server bootstrap.
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

/// Receiver half: cloned into each background task.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

/// Create a linked controller/signal pair.
pub fn shutdown_channel() -> (ShutdownController, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownController { tx }, ShutdownSignal { rx })
}

impl ShutdownController {
    /// Initiate shutdown.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    /// Block until SIGTERM or SIGINT, then trigger shutdown.
    pub async fn listen_for_signals(self) {
        let ctrl_c = async {
            let _ = signal::ctrl_c().await;
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(_) => std::future::pending::<()>().await,
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => info!("received SIGINT, shutting down"),
            _ = terminate => info!("received SIGTERM, shutting down"),
        }

        self.trigger();
    }
}

impl ShutdownSignal {
    /// Whether shutdown has been initiated.
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until shutdown is signaled.
    pub async fn recv(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                // Controller dropped: treat as shutdown.
                return;
            }
        }
    }
}
