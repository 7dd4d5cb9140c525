//! Error types for logger setup

use thiserror::Error;

/// Result type for logger operations
pub type LogResult<T> = Result<T, LogError>;

/// Logger setup errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// The level / directive string could not be parsed
    #[error("Invalid filter '{filter}': {reason}")]
    InvalidFilter {
        /// The rejected directive string
        filter: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber is already installed for this process
    #[error("A global logger is already installed")]
    AlreadyInitialized,
}

impl LogError {
    /// Create an invalid filter error
    pub fn invalid_filter(filter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            filter: filter.to_string(),
            reason: reason.into(),
        }
    }
}
