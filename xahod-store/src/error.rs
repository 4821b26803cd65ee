//! Store layer errors

use thiserror::Error;
use xahod_domain::Entity;
use xahod_query::QueryError;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a fetch collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure (connection refused, DNS, TLS)
    #[error("Request failed: {0}")]
    Request(String),

    /// Non-success HTTP status
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Response body did not decode
    #[error("Decode error: {0}")]
    Decode(String),

    /// Request exceeded its timeout
    #[error("Request timed out")]
    Timeout,

    /// Collaborator answered with the wrong collection
    #[error("Expected {expected} collection, got {actual}")]
    EntityMismatch {
        /// Entity that was requested
        expected: Entity,
        /// Entity that came back
        actual: Entity,
    },

    /// Collaborator cannot serve requests
    #[error("Fetch collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur in the store layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Name-based commit with a name the store does not define
    #[error("Unknown mutation '{name}' on store '{store}'")]
    UnknownMutation {
        /// Store id
        store: String,
        /// Requested mutation name
        name: String,
    },

    /// Name-based dispatch with a name the store does not define
    #[error("Unknown action '{name}' on store '{store}'")]
    UnknownAction {
        /// Store id
        store: String,
        /// Requested action name
        name: String,
    },

    /// Payload did not decode into the operation's argument
    #[error("Invalid payload for '{name}': {message}")]
    InvalidPayload {
        /// Operation name
        name: String,
        /// Decoder message
        message: String,
    },

    /// Fetch collaborator failure
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// List query failure
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
}

impl StoreError {
    /// Create an unknown mutation error
    pub fn unknown_mutation(store: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownMutation {
            store: store.into(),
            name: name.into(),
        }
    }

    /// Create an unknown action error
    pub fn unknown_action(store: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownAction {
            store: store.into(),
            name: name.into(),
        }
    }
}
