//! Implements a struct that holds the state shared by the server's request
//! handlers.

use std::{path::Path, sync::Arc};

use crate::{
    Error,
    dataset::{Transaction, load_transactions},
};

/// The state of the dashboard server.
///
/// The transaction table is loaded once at startup and never mutated, so
/// handlers share it behind an [Arc] without any locking.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The full order history, sorted by approval time.
    pub transactions: Arc<Vec<Transaction>>,
}

impl AppState {
    /// Create a new [AppState] from an already loaded transaction table.
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self {
            transactions: Arc::new(transactions),
        }
    }

    /// Create a new [AppState] by loading the order history CSV at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is missing a required
    /// column.
    pub fn from_csv(path: &Path) -> Result<Self, Error> {
        Ok(Self::new(load_transactions(path)?))
    }
}
