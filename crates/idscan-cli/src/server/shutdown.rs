//! Signals that start a graceful shutdown.

use std::fmt;
use std::io;

use crate::TRACING_TARGET_SHUTDOWN;

/// The signal that stopped the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Interrupt,
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        })
    }
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
///
/// A handler that cannot be installed is logged and never fires, so the
/// other signal still works.
pub async fn shutdown_signal() {
    let signal = tokio::select! {
        () = installed(Signal::Interrupt, tokio::signal::ctrl_c()) => Signal::Interrupt,
        () = terminate() => Signal::Terminate,
    };

    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        %signal,
        "Received shutdown signal, draining in-flight requests"
    );
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(error) => installed(Signal::Terminate, async { Err(error) }).await,
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

async fn installed(signal: Signal, wait: impl Future<Output = io::Result<()>>) {
    if let Err(error) = wait.await {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            %signal,
            error = %error,
            "Failed to install signal handler"
        );
        std::future::pending::<()>().await;
    }
}
