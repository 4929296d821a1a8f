//! Error types for gale-router

use thiserror::Error;

/// Result type alias for route registration
pub type Result<T> = std::result::Result<T, Error>;

/// Registration errors. A miss at match time is not an error, see [`crate::MatchResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed route template
    #[error("Invalid pattern {pattern:?}: {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    /// Same method and raw pattern registered twice
    #[error("Duplicate route: {method} {pattern}")]
    DuplicateRoute { method: String, pattern: String },
}

impl Error {
    pub(crate) fn invalid(pattern: &str, reason: &'static str) -> Self {
        Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        }
    }
}
