//! OS signal handling.
//!
//! # Design Decisions
//! - SIGINT (Ctrl+C) and, on Unix, SIGTERM both request graceful shutdown
//! - Callers wait again after the first signal; a second one forces exit

use std::io;

/// Wait for a termination signal and return its name.
pub async fn wait_for_signal() -> io::Result<&'static str> {
    let ctrl_c = async { tokio::signal::ctrl_c().await.map(|()| "SIGINT") };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        signal(SignalKind::terminate())?.recv().await;
        Ok::<_, io::Error>("SIGTERM")
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<io::Result<&'static str>>();

    tokio::select! {
        result = ctrl_c => result,
        result = terminate => result,
    }
}
