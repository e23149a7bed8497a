// Signal handling module
//
// SIGINT (Ctrl+C) and SIGTERM stop the accept loop so the listener is
// dropped and the port released before the process exits.

use crate::logger;

/// Resolves when the process is asked to stop
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            logger::log_warning(&format!("Failed to register signal handlers: {e}"));
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => logger::log_debug("SIGTERM received"),
        _ = sigint.recv() => logger::log_debug("SIGINT received"),
    }
}

/// Non-Unix fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => logger::log_debug("Ctrl+C received"),
        Err(e) => {
            logger::log_warning(&format!("Failed to listen for Ctrl+C: {e}"));
            std::future::pending::<()>().await;
        }
    }
}
