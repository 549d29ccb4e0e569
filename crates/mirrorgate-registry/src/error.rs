//! Error types for mirror setup probes.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that make the mirror registry unusable.
///
/// The gate captures the first probe failure and keeps it for diagnostics.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No mirror host was configured.
    #[error("Mirror registry is not configured: {setting} is not set")]
    NotConfigured {
        /// The missing setting.
        setting: String,
    },

    /// The gate was pinned unavailable.
    #[error("Mirror registry was forced unavailable: {reason}")]
    ForcedUnavailable {
        /// Why the mirror was disabled.
        reason: String,
    },

    /// No credentials were configured and the docker config has no entry for the mirror.
    #[error("The mirror registry {host} was not added to the docker config at {path}")]
    MissingDockerAuth {
        /// Mirror host.
        host: String,
        /// Docker config path.
        path: PathBuf,
    },

    /// The docker config exists but is not a JSON object.
    #[error("Invalid docker config at {path}: {message}")]
    InvalidDockerConfig {
        /// Docker config path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The configured CA certificate could not be used for TLS.
    #[error("Invalid CA certificate {path}: {message}")]
    InvalidCertificate {
        /// Certificate path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The docker config location could not be determined.
    #[error("Cannot locate the docker config: set DOCKER_CONFIG or HOME")]
    DockerConfigUnresolved,

    /// File I/O error.
    #[error("File I/O error at {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {source}")]
    Json {
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Invalid probe URL.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },

    /// Failed to connect to the mirror.
    #[error("Failed to connect to mirror registry at {url}: {source}")]
    ConnectionFailed {
        /// Mirror URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The mirror rejected the configured credentials.
    #[error("Authentication to mirror registry {host} failed with HTTP {status}")]
    AuthenticationFailed {
        /// Mirror host.
        host: String,
        /// HTTP status code.
        status: u16,
    },

    /// Unexpected HTTP response from the mirror.
    #[error("HTTP error from mirror registry: {status} - {message}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_builder() {
            Self::ConnectionFailed {
                url: err
                    .url()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string),
                source: err,
            }
        } else {
            Self::HttpError {
                status: err.status().map_or(0, |s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json { source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_configured() {
        let err = ProbeError::NotConfigured {
            setting: "MIRRORGATE_MIRROR_HOST".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Mirror registry is not configured: MIRRORGATE_MIRROR_HOST is not set"
        );
    }

    #[test]
    fn test_error_display_missing_docker_auth() {
        let err = ProbeError::MissingDockerAuth {
            host: "mirror.example.com".to_string(),
            path: PathBuf::from("/home/ci/.docker/config.json"),
        };
        assert!(err.to_string().contains("was not added to the docker config"));
    }

    #[test]
    fn test_error_display_forced() {
        let err = ProbeError::ForcedUnavailable {
            reason: "disabled by operator".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Mirror registry was forced unavailable: disabled by operator"
        );
    }
}
