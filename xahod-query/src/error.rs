//! Query engine error types

use thiserror::Error;

/// Errors that can occur while running a list query
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Page or page size out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// `sortBy` names a field the record does not declare
    #[error("Unknown field: {0}")]
    UnknownField(String),
}
