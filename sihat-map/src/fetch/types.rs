//! Fetch error types.

use thiserror::Error;

/// Errors that can occur while fetching a remote resource.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Transport failure or non-success status
    #[error("HTTP error: {0}")]
    Http(String),

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}
