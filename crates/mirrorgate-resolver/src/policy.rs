//! Naming constants consulted by the resolution rules.

use std::path::Path;

use mirrorgate_core::{ImageReference, MirrorSelection};
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Naming conventions the rules match image references against.
///
/// Every field has a default, so a policy file only needs the values it
/// overrides.
///
/// # Examples
///
/// ```rust
/// use mirrorgate_resolver::MirrorPolicy;
///
/// let policy = MirrorPolicy::from_yaml_str("standard_mirror: docker-remote\n").unwrap();
/// assert_eq!(policy.standard_mirror, "docker-remote");
/// assert_eq!(policy.legacy_mirror, "wasliberty-infrastructure-docker");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorPolicy {
    /// Repositories containing this substring only exist in the mirror.
    pub mirror_only_marker: String,
    /// Registries containing this substring are not reachable by everyone.
    pub private_registry_pattern: String,
    /// Mirror name for most repositories.
    pub standard_mirror: String,
    /// Mirror name for repositories under a legacy prefix.
    pub legacy_mirror: String,
    /// Repository prefixes routed through the legacy mirror.
    pub legacy_prefixes: Vec<String>,
    /// Registry of images built locally at test time.
    pub synthetic_registry: String,
    /// First repository segment of images built locally at test time.
    pub synthetic_namespace: String,
    /// Tag of images built locally at test time.
    pub synthetic_tag: String,
    /// Repository name given to images committed from a running container.
    pub committed_image_repository: String,
}

impl Default for MirrorPolicy {
    fn default() -> Self {
        Self {
            mirror_only_marker: "wasliberty-".to_string(),
            private_registry_pattern: "artifactory.swg-devops.com".to_string(),
            standard_mirror: "wasliberty-docker-remote".to_string(),
            legacy_mirror: "wasliberty-infrastructure-docker".to_string(),
            legacy_prefixes: vec!["kyleaure/".to_string()],
            synthetic_registry: "localhost".to_string(),
            synthetic_namespace: "testcontainers".to_string(),
            synthetic_tag: "latest".to_string(),
            committed_image_repository: "sha256".to_string(),
        }
    }
}

impl MirrorPolicy {
    /// Parses and validates a policy from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Parse`] for malformed YAML or unknown keys and
    /// [`PolicyError::Invalid`] if validation fails.
    pub fn from_yaml_str(content: &str) -> Result<Self, PolicyError> {
        let policy: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)?
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Reads, parses and validates a policy file.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Io`] if the file cannot be read, otherwise the
    /// errors of [`from_yaml_str`](Self::from_yaml_str).
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PolicyError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Checks that the policy can drive the rules.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let required = [
            ("mirror_only_marker", &self.mirror_only_marker),
            ("private_registry_pattern", &self.private_registry_pattern),
            ("standard_mirror", &self.standard_mirror),
            ("legacy_mirror", &self.legacy_mirror),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(PolicyError::Invalid {
                reason: format!("{field} must not be empty"),
            });
        }

        for name in [&self.standard_mirror, &self.legacy_mirror] {
            if name.starts_with('/') || name.ends_with('/') || name.contains(char::is_whitespace) {
                return Err(PolicyError::Invalid {
                    reason: format!("mirror name '{name}' is not a valid repository prefix"),
                });
            }
        }

        if self.legacy_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err(PolicyError::Invalid {
                reason: "legacy_prefixes must not contain empty entries".to_string(),
            });
        }

        Ok(())
    }

    /// Picks the mirror a repository is served from.
    #[must_use]
    pub fn select_mirror(&self, image: &ImageReference) -> MirrorSelection {
        MirrorSelection::for_repository(image.repository(), &self.legacy_prefixes)
    }

    /// Returns the mirror name a repository is served from.
    #[must_use]
    pub fn mirror_name(&self, image: &ImageReference) -> &str {
        self.select_mirror(image)
            .mirror_name(&self.standard_mirror, &self.legacy_mirror)
    }

    /// Returns true if the image was built or committed locally at test time.
    #[must_use]
    pub fn is_synthetic(&self, image: &ImageReference) -> bool {
        let built = image.registry() == Some(self.synthetic_registry.as_str())
            && image.namespace() == self.synthetic_namespace
            && image.version_part() == self.synthetic_tag;
        built || image.repository() == self.committed_image_repository
    }

    /// Returns true if the repository only exists in the mirror.
    #[must_use]
    pub fn is_mirror_only(&self, image: &ImageReference) -> bool {
        image.repository().contains(&self.mirror_only_marker)
    }

    /// Returns true if the image names a private-only registry.
    #[must_use]
    pub fn is_private_registry(&self, image: &ImageReference) -> bool {
        image
            .registry()
            .is_some_and(|registry| registry.contains(&self.private_registry_pattern))
    }
}
