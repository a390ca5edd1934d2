//! Error types for ignore rule parsing.

use thiserror::Error;

/// Errors that can occur while building an ignore rule set.
#[derive(Debug, Error)]
pub enum IgnoreError {
    /// A line could not be compiled as a glob.
    #[error("invalid ignore pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// `!` re-include patterns are not supported; any match excludes.
    #[error("negated ignore pattern not supported: {0:?}")]
    NegationUnsupported(String),

    /// The ignore file exists but could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for ignore operations.
pub type IgnoreResult<T> = std::result::Result<T, IgnoreError>;
