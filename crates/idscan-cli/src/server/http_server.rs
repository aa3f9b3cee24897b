//! Plain HTTP listener with graceful shutdown.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::lifecycle::serve_with_shutdown;
use super::{ServerError, ServerResult, shutdown_signal};
use crate::config::ServerConfig;
use crate::{TRACING_TARGET_SHUTDOWN, TRACING_TARGET_STARTUP};

/// Binds the configured address and serves `app` until a shutdown signal.
///
/// After the signal, in-flight requests get at most
/// [`ServerConfig::shutdown_timeout`] to complete before the server stops.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address cannot be bound and
/// [`ServerError::Runtime`] if the server fails while running.
pub async fn serve_http(app: Router, config: ServerConfig) -> ServerResult<()> {
    let addr = config.server_addr();

    let listener = TcpListener::bind(addr).await.map_err(|source| {
        tracing::error!(
            target: TRACING_TARGET_STARTUP,
            addr = %addr,
            error = %source,
            "Failed to bind server address"
        );
        ServerError::Bind {
            address: addr.to_string(),
            source,
        }
    })?;

    let grace = config.shutdown_timeout();
    serve_with_shutdown(&config, || async move {
        let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => return result,
            _ = signalled_rx => {}
        }

        drain(server, grace).await
    })
    .await
}

/// Waits for in-flight requests, giving up after `grace`.
async fn drain<F>(server: F, grace: Duration) -> std::io::Result<()>
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match tokio::time::timeout(grace, server).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                target: TRACING_TARGET_SHUTDOWN,
                grace_secs = grace.as_secs(),
                "In-flight requests did not finish in time, forcing shutdown"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;

    use super::*;

    #[tokio::test]
    async fn drain_gives_up_after_grace() {
        let result = drain(pending::<std::io::Result<()>>(), Duration::from_millis(10)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn bind_errors_name_the_address() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();
        let config = ServerConfig {
            port,
            ..ServerConfig::default()
        };

        let error = serve_http(Router::new(), config).await.unwrap_err();
        assert!(matches!(error, ServerError::Bind { .. }));
        assert!(error.to_string().contains(&port.to_string()));
    }
}
