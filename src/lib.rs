//! Fineledger is a JSON REST API for managing a college department's student
//! fines, fee payments and expenditures.
//!
//! A single admin account records fines against students, tracks
//! departmental spending and pulls aggregated reports. The data lives in a
//! SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

pub mod admin;
pub mod auth;
pub mod category;
pub mod db;
pub mod endpoints;
mod error;
pub mod expenditure;
pub mod fine;
pub mod logging;
pub mod pagination;
pub mod password;
pub mod report;
pub mod reset;
pub mod response;
mod routing;
pub mod state;
pub mod student;

pub use error::Error;
pub use routing::build_router;
pub use state::AppState;

#[cfg(test)]
pub(crate) mod test_utils;

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
