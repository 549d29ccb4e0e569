//! Error types for image resolution.

use std::path::PathBuf;
use std::sync::Arc;

use mirrorgate_core::ImageReference;
use mirrorgate_registry::ProbeError;
use thiserror::Error;

/// Fatal resolution failures. Neither is retryable within the same run.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The explicit registry is only reachable by some developers.
    #[error(
        "Image {image} uses registry {registry}, which matches the private-only pattern \
         '{pattern}'; not every developer can reach it, use a public registry instead"
    )]
    UnsupportedPrivateRegistry {
        /// The requested image.
        image: ImageReference,
        /// Its registry host.
        registry: String,
        /// The pattern it matched.
        pattern: String,
    },

    /// A rule required the mirror but the gate reports it unusable.
    #[error(
        "Need to swap image {original} --> {resolved}; reason: {reason}; \
         error: the mirror registry is unavailable ({})",
        describe_setup_error(.source)
    )]
    MirrorRequiredButUnavailable {
        /// The requested image.
        original: ImageReference,
        /// The mirror reference it would have resolved to.
        resolved: ImageReference,
        /// Why the mirror was required.
        reason: String,
        /// The failure captured when the gate probed the mirror.
        #[source]
        source: Option<Arc<ProbeError>>,
    },
}

impl ResolveError {
    /// Returns the requested image the failure is about.
    #[must_use]
    pub const fn image(&self) -> &ImageReference {
        match self {
            Self::UnsupportedPrivateRegistry { image, .. } => image,
            Self::MirrorRequiredButUnavailable { original, .. } => original,
        }
    }
}

#[allow(clippy::ref_option)]
fn describe_setup_error(source: &Option<Arc<ProbeError>>) -> String {
    source
        .as_ref()
        .map_or_else(|| "no setup error was captured".to_string(), ToString::to_string)
}

/// Errors loading a [`MirrorPolicy`](crate::MirrorPolicy).
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy file could not be read.
    #[error("Failed to read policy file {path}: {source}")]
    Io {
        /// Policy file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The policy document is not valid YAML for a policy.
    #[error("Failed to parse policy: {source}")]
    Parse {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },

    /// The policy parsed but is unusable.
    #[error("Invalid policy: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}
