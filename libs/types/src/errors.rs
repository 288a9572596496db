//! Error types for the chart feed
//!
//! Every network-boundary failure is converted into a `FeedError` at the
//! call site. Empty windows and superseded responses are not errors and
//! have no variant here.

use thiserror::Error;

/// Coarse failure kind surfaced to diagnostics and the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request could not be sent, or the response could not be parsed.
    TransportFailure,
    /// Input or remote data failed a contract check.
    ValidationFailure,
}

/// Top-level feed error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl FeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::Transport(_) | FeedError::Decode(_) | FeedError::Server { .. } => {
                ErrorKind::TransportFailure
            }
            FeedError::Validation(_) => ErrorKind::ValidationFailure,
        }
    }
}

/// Contract violations in user input or remote payloads
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Catalog response is not a JSON array")]
    CatalogNotArray,

    #[error("Catalog entry {index} must have exactly one key, found {keys}")]
    CatalogEntryKeys { index: usize, keys: usize },

    #[error("Catalog entry {index} value is not a string")]
    CatalogEntryNotString { index: usize },

    #[error("Catalog entry {index} has an empty dataset name")]
    EmptyDatasetName { index: usize },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Password must include letters, numbers, and a special character")]
    WeakPassword,

    #[error("Rejected by server: {0}")]
    Rejected(String),
}
