//! Shutdown Handling
//!
//! The relay performs no graceful drain: once a shutdown signal arrives the
//! process exits and all sockets and tasks are torn down abruptly.

use tokio::signal;
use tracing::info;

use crate::Result;

/// Wait for SIGTERM or SIGINT (Ctrl+C on Windows).
pub async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down");
            }
        }
    }

    #[cfg(windows)]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}
