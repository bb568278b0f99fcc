//! Graceful shutdown signal handling

use std::{io, time::Duration};

use salvo::server::ServerHandle;
use thiserror::Error;
use tokio::signal;
use tracing::info;

use reel_app::lifecycle::Lifecycle;

#[derive(Debug, Error)]
pub(crate) enum ShutdownSignalError {
    #[error("failed to install Ctrl+C handler: {0}")]
    CtrlC(#[source] io::Error),

    #[cfg(unix)]
    #[error("failed to install SIGTERM handler: {0}")]
    SigTerm(#[source] io::Error),
}

/// Wait for SIGINT or SIGTERM, then raise the shared shutdown signal and stop
/// accepting connections. Open connections get up to `grace` to finish; the
/// caller drains the remaining tracked work once the server has stopped.
pub(crate) async fn listen(
    handle: ServerHandle,
    lifecycle: Lifecycle,
    grace: Duration,
) -> Result<(), ShutdownSignalError> {
    let signal = wait_for_signal().await?;

    info!(signal, "shutting down server");

    lifecycle.shutdown_token().cancel();
    handle.stop_graceful(grace);

    Ok(())
}

async fn wait_for_signal() -> Result<&'static str, ShutdownSignalError> {
    let ctrl_c = async {
        signal::ctrl_c().await.map_err(ShutdownSignalError::CtrlC)?;

        Ok::<_, ShutdownSignalError>("SIGINT")
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(ShutdownSignalError::SigTerm)?
            .recv()
            .await;

        Ok::<_, ShutdownSignalError>("SIGTERM")
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<&'static str, ShutdownSignalError>>();

    tokio::select! {
        result = ctrl_c => result,
        result = terminate => result,
    }
}
