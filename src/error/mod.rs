//! Error handling for case-control matching.

use arrow::error::ArrowError;

use crate::algorithm::matching::validation::ValidationReport;

/// Specialized error type for the matcher
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    /// One or more preconditions failed; nothing was computed
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    /// Error from an Arrow kernel or while building the output batch
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error decoding a JSON matching request
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal invariant of the matching loop was broken; the run is aborted
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl MatchingError {
    /// Create an invariant violation error
    pub fn invariant<S: Into<String>>(message: S) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// The validation report, if this error came from the validator
    #[must_use]
    pub const fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation(report) => Some(report),
            _ => None,
        }
    }
}

/// Result type for matching operations
pub type Result<T> = std::result::Result<T, MatchingError>;
