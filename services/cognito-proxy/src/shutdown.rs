//! Graceful Shutdown Module
//!
//! Signal handling and a bounded drain for in-flight requests.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

/// Broadcasts the shutdown moment to the server and the drain timer.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once shutdown has been triggered.
    pub async fn recv(mut self) {
        // An error means the trigger was dropped, which also ends the wait.
        let _ = self.receiver.wait_for(|fired| *fired).await;
    }

    /// Non-blocking check.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Owner side of [`ShutdownSignal`].
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Creates a trigger and its first signal.
    #[must_use]
    pub fn new() -> (Self, ShutdownSignal) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, ShutdownSignal { receiver })
    }

    /// Another signal bound to this trigger.
    #[must_use]
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Fires every signal.
    pub fn fire(&self) {
        self.sender.send_replace(true);
    }
}

/// Waits for SIGTERM or SIGINT
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating shutdown"),
        () = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}

/// Runs `server` until it ends on its own or `signal` fires.
///
/// Once `signal` fires the server gets `drain` to finish in-flight requests;
/// after that it is dropped. `server` is expected to observe a signal from
/// the same trigger for its own graceful stop.
pub async fn run_with_graceful_shutdown<F, E>(
    server: F,
    signal: ShutdownSignal,
    drain: Duration,
) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
{
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => return result,
        () = signal.recv() => info!("Shutdown signal received, draining"),
    }

    match tokio::time::timeout(drain, server).await {
        Ok(result) => {
            info!("Server drained gracefully");
            result
        }
        Err(_) => {
            warn!(?drain, "Drain timeout reached, dropping remaining connections");
            Ok(())
        }
    }
}
