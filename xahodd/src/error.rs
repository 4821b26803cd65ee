//! Daemon error types.

use thiserror::Error;
use xahod_domain::Entity;
use xahod_store::{FetchError, StoreError};

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Fetch collaborator error
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Record not found
    #[error("{entity} record not found: {key}")]
    NotFound {
        /// Entity searched
        entity: Entity,
        /// Requested key
        key: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server error
    #[error("Server error: {0}")]
    Server(String),

    /// Shutdown requested
    #[error("Shutdown requested")]
    Shutdown,
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
