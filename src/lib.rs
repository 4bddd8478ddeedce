//! Shoplens is a web app for exploring an e-commerce store's order history
//! through a fixed set of aggregate reports: daily order volume and revenue,
//! best and worst selling product categories, and customer counts by city,
//! state and payment type.
//!
//! The order export is loaded into memory once at startup and every
//! date-range change recomputes the reports from scratch. This library
//! provides an HTTP server that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod dashboard;
mod dataset;
mod endpoints;
mod html;
mod logging;
mod not_found;
mod routing;

pub use app_state::AppState;
pub use dataset::{Transaction, load_transactions, read_transactions};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
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

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A column required by the data model is absent from the dataset header.
    ///
    /// This is fatal: the dataset is expected to be cleaned upstream, so a
    /// missing column means the wrong file was supplied.
    #[error("the dataset is missing the required column \"{0}\"")]
    MissingColumn(String),

    /// The dataset CSV could not be opened, read, or parsed row by row.
    ///
    /// The error string names the offending line where one is known.
    #[error("could not read the dataset CSV: {0}")]
    InvalidCsv(String),
}
