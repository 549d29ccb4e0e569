//! Error types for the Mirrorgate test tooling.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fixture operations.
pub type Result<T> = std::result::Result<T, FixtureError>;

/// Errors that can occur while loading fixtures.
#[derive(Error, Debug)]
pub enum FixtureError {
    /// Failed to read a fixture file.
    #[error("Failed to read fixture file {path}: {source}")]
    FileRead {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Fixture document is not valid YAML.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A fixture names an image that does not parse.
    #[error("Fixture '{name}' has an invalid image: {source}")]
    InvalidImage {
        /// Fixture name.
        name: String,
        /// Parse failure.
        #[source]
        source: mirrorgate_core::Error,
    },

    /// A fixture is internally inconsistent.
    #[error("Invalid fixture '{name}': {message}")]
    Invalid {
        /// Fixture name.
        name: String,
        /// What is wrong.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FixtureError::Invalid {
            name: "remote".to_string(),
            message: "expects both an error and an outcome".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid fixture 'remote': expects both an error and an outcome"
        );
    }
}
