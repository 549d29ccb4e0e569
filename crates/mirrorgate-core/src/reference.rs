//! Container image references.
//!
//! This module defines [`ImageReference`], the immutable value the resolver
//! works on, and its parser for the `[registry/]repository[:tag|@digest]`
//! form used by container clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tag assumed when a reference names neither a tag nor a digest.
pub const DEFAULT_TAG: &str = "latest";

const MAX_TAG_LEN: usize = 128;
const MIN_DIGEST_HEX_LEN: usize = 32;

/// The version part of an image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageVersion {
    /// A mutable tag such as `1.0` or `latest`.
    Tag(String),
    /// A content digest such as `sha256:0123...`.
    Digest(String),
}

impl ImageVersion {
    /// Returns the raw tag or digest string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tag(tag) => tag,
            Self::Digest(digest) => digest,
        }
    }
}

/// A parsed container image reference.
///
/// The repository is never empty. A missing registry means the default
/// public registry.
///
/// # Examples
///
/// ```rust
/// use mirrorgate_core::{ImageReference, ImageVersion};
///
/// let image: ImageReference = "localhost:5000/team/app@sha256:0123456789abcdef0123456789abcdef"
///     .parse()
///     .unwrap();
/// assert_eq!(image.registry(), Some("localhost:5000"));
/// assert_eq!(image.namespace(), "team");
/// assert!(matches!(image.version(), ImageVersion::Digest(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    registry: Option<String>,
    repository: String,
    version: ImageVersion,
}

impl ImageReference {
    /// Creates a reference on the default registry with the given tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedReference`] if the repository or tag is invalid.
    pub fn new(repository: &str, tag: &str) -> Result<Self> {
        let display = format!("{repository}:{tag}");
        validate_repository(&display, repository)?;
        validate_tag(&display, tag)?;
        Ok(Self {
            registry: None,
            repository: repository.to_string(),
            version: ImageVersion::Tag(tag.to_string()),
        })
    }

    /// Returns the explicit registry host, if any.
    #[must_use]
    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    /// Returns the repository path (e.g. `org/name`).
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the first path segment of the repository.
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.repository
            .split('/')
            .next()
            .unwrap_or(&self.repository)
    }

    /// Returns the tag or digest.
    #[must_use]
    pub const fn version(&self) -> &ImageVersion {
        &self.version
    }

    /// Returns the raw tag or digest string.
    #[must_use]
    pub fn version_part(&self) -> &str {
        self.version.as_str()
    }

    /// Returns the tag, if the version is a tag.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match &self.version {
            ImageVersion::Tag(tag) => Some(tag),
            ImageVersion::Digest(_) => None,
        }
    }

    /// Returns the digest, if the version is a digest.
    #[must_use]
    pub fn digest(&self) -> Option<&str> {
        match &self.version {
            ImageVersion::Tag(_) => None,
            ImageVersion::Digest(digest) => Some(digest),
        }
    }

    /// Returns true if an explicit, non-empty registry is set.
    #[must_use]
    pub fn has_registry(&self) -> bool {
        self.registry.as_deref().is_some_and(|r| !r.is_empty())
    }

    /// Returns a copy of this reference on a different registry.
    ///
    /// An empty host clears the registry.
    #[must_use]
    pub fn with_registry(&self, registry: &str) -> Self {
        Self {
            registry: (!registry.is_empty()).then(|| registry.to_string()),
            repository: self.repository.clone(),
            version: self.version.clone(),
        }
    }

    /// Returns a copy of this reference with `prefix/` prepended to the
    /// repository path.
    #[must_use]
    pub fn with_repository_prefix(&self, prefix: &str) -> Self {
        let repository = if prefix.is_empty() {
            self.repository.clone()
        } else {
            format!("{}/{}", prefix.trim_end_matches('/'), self.repository)
        };
        Self {
            registry: self.registry.clone(),
            repository,
            version: self.version.clone(),
        }
    }

    /// Returns the canonical `[registry/]repository(:tag|@digest)` form.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{registry}/")?;
        }
        match &self.version {
            ImageVersion::Tag(tag) => write!(f, "{}:{tag}", self.repository),
            ImageVersion::Digest(digest) => write!(f, "{}@{digest}", self.repository),
        }
    }
}

impl FromStr for ImageReference {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::malformed(input, "reference is empty"));
        }
        if input.chars().any(char::is_whitespace) {
            return Err(Error::malformed(input, "reference contains whitespace"));
        }

        let (registry, remainder) = match input.split_once('/') {
            Some((first, rest)) if looks_like_registry(first) => (Some(first), rest),
            _ => (None, input),
        };

        let (repository, version) = if let Some((repository, digest)) = remainder.split_once('@') {
            validate_digest(input, digest)?;
            (repository, ImageVersion::Digest(digest.to_string()))
        } else {
            match remainder.rsplit_once(':') {
                Some((repository, tag)) if !tag.contains('/') => {
                    validate_tag(input, tag)?;
                    (repository, ImageVersion::Tag(tag.to_string()))
                }
                _ => (remainder, ImageVersion::Tag(DEFAULT_TAG.to_string())),
            }
        };

        if let Some(registry) = registry {
            validate_registry(input, registry)?;
        }
        validate_repository(input, repository)?;

        Ok(Self {
            registry: registry.map(ToString::to_string),
            repository: repository.to_string(),
            version,
        })
    }
}

impl Serialize for ImageReference {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ImageReference {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Docker's heuristic: a leading segment is a registry host when it has a
/// dot or a port, or is `localhost`.
fn looks_like_registry(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':') || segment == "localhost"
}

fn validate_registry(input: &str, registry: &str) -> Result<()> {
    let valid = !registry.is_empty()
        && registry
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'));
    if valid {
        Ok(())
    } else {
        Err(Error::malformed(
            input,
            format!("invalid registry host '{registry}'"),
        ))
    }
}

fn validate_repository(input: &str, repository: &str) -> Result<()> {
    if repository.is_empty() {
        return Err(Error::malformed(input, "repository is empty"));
    }
    for segment in repository.split('/') {
        let Some(first) = segment.chars().next() else {
            return Err(Error::malformed(input, "repository has an empty path segment"));
        };
        if !(first.is_ascii_lowercase() || first.is_ascii_digit()) {
            return Err(Error::malformed(
                input,
                format!("path segment '{segment}' must start with a lowercase letter or digit"),
            ));
        }
        let valid = segment.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
        });
        if !valid {
            return Err(Error::malformed(
                input,
                format!("path segment '{segment}' must be lowercase alphanumerics, '.', '_' or '-'"),
            ));
        }
    }
    Ok(())
}

fn validate_tag(input: &str, tag: &str) -> Result<()> {
    let Some(first) = tag.chars().next() else {
        return Err(Error::malformed(input, "tag is empty"));
    };
    if tag.len() > MAX_TAG_LEN {
        return Err(Error::malformed(
            input,
            format!("tag exceeds {MAX_TAG_LEN} characters"),
        ));
    }
    let valid = (first.is_ascii_alphanumeric() || first == '_')
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(())
    } else {
        Err(Error::malformed(input, format!("invalid tag '{tag}'")))
    }
}

fn validate_digest(input: &str, digest: &str) -> Result<()> {
    let Some((algorithm, encoded)) = digest.split_once(':') else {
        return Err(Error::malformed(
            input,
            "digest must have the form <algorithm>:<hex>",
        ));
    };
    let algorithm_ok = !algorithm.is_empty()
        && algorithm
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    let encoded_ok =
        encoded.len() >= MIN_DIGEST_HEX_LEN && encoded.chars().all(|c| c.is_ascii_hexdigit());
    if algorithm_ok && encoded_ok {
        Ok(())
    } else {
        Err(Error::malformed(input, format!("invalid digest '{digest}'")))
    }
}
