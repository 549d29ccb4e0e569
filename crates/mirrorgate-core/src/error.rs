//! Error types for mirrorgate core operations.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mirrorgate core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An image reference string could not be parsed.
    #[error("Malformed image reference '{reference}': {reason}")]
    MalformedReference {
        /// The rejected input.
        reference: String,
        /// Why the input was rejected.
        reason: String,
    },
}

impl Error {
    pub(crate) fn malformed(reference: &str, reason: impl Into<String>) -> Self {
        Self::MalformedReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}
