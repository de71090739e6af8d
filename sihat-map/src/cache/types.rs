//! Failure outcome for layer activation.

use crate::engine::EngineError;
use thiserror::Error;

/// Why a dataset could not be shown.
///
/// Layer activation never rolls back visibility on failure; the layer stays
/// registered and empty. This type exists so callers can assert on the
/// outcome without scraping logs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureReason {
    /// Transport failure or non-success status
    #[error("failed to fetch {url}: {message}")]
    Network { url: String, message: String },

    /// Response body was not JSON
    #[error("failed to parse {url}: {message}")]
    Parse { url: String, message: String },

    /// No descriptor with this id or alias
    #[error("unknown layer: {0}")]
    UnknownLayer(String),

    /// Operation attempted before the style finished loading
    #[error("map engine not ready (state: {state})")]
    EngineNotReady { state: String },

    /// Lifecycle call out of order
    #[error("cannot {action} while {state}")]
    InvalidTransition { state: String, action: &'static str },

    /// The engine handle was released
    #[error("map engine has been disposed")]
    EngineDisposed,

    /// Unexpected engine rejection
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl FailureReason {
    /// Whether this failure came from the network or the payload.
    pub fn is_data_failure(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Parse { .. })
    }
}
