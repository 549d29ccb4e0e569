//! Resolution fixtures.
//!
//! A fixture describes one resolution: the requested image, the flags and
//! gate state it runs under, and what the resolver is expected to return.

use std::fs;
use std::path::{Path, PathBuf};

use mirrorgate_core::{ImageReference, ResolutionRule};
use serde::{Deserialize, Serialize};

use crate::error::{FixtureError, Result};

/// Fatal errors a fixture can expect, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedError {
    /// The image names a private-only registry.
    UnsupportedPrivateRegistry,
    /// The mirror was required but unusable.
    MirrorRequiredButUnavailable,
}

/// Expected result of a resolution. Unset fields are not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureExpectation {
    /// Canonical name of the resolved image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,

    /// Whether the mirror is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_mirror: Option<bool>,

    /// The deciding rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<ResolutionRule>,

    /// Substring of the reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_contains: Option<String>,

    /// Whether the outcome reaches the audit collector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collected: Option<bool>,

    /// The resolution fails with this error instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ExpectedError>,
}

/// One resolution scenario.
///
/// # Examples
///
/// ```rust
/// use mirrorgate_test::ResolutionFixture;
///
/// let fixture = ResolutionFixture::new("default", "foo/bar:1.0")
///     .with_mirror_available(false)
///     .expect_resolved("foo/bar:1.0");
/// assert_eq!(fixture.image().unwrap().to_string(), "foo/bar:1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolutionFixture {
    /// Name of the fixture.
    pub name: String,

    /// What the fixture checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Requested image.
    #[serde(rename = "image")]
    pub image_name: String,

    /// Whether the container host is remote.
    #[serde(default)]
    pub remote_host: bool,

    /// Force-external override.
    #[serde(default)]
    pub force_external: bool,

    /// Mock-mirror override.
    #[serde(default)]
    pub mock_mirror: bool,

    /// What the availability gate reports.
    #[serde(default)]
    pub mirror_available: bool,

    /// Expected result.
    #[serde(default)]
    pub expect: FixtureExpectation,
}

impl ResolutionFixture {
    /// Creates a fixture on a local host with the mirror unavailable.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            image_name: image.into(),
            remote_host: false,
            force_external: false,
            mock_mirror: false,
            mirror_available: false,
            expect: FixtureExpectation::default(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets whether the container host is remote.
    #[must_use]
    pub const fn with_remote_host(mut self, remote: bool) -> Self {
        self.remote_host = remote;
        self
    }

    /// Sets the force-external override.
    #[must_use]
    pub const fn with_force_external(mut self, force: bool) -> Self {
        self.force_external = force;
        self
    }

    /// Sets the mock-mirror override.
    #[must_use]
    pub const fn with_mock_mirror(mut self, mock: bool) -> Self {
        self.mock_mirror = mock;
        self
    }

    /// Sets what the gate reports.
    #[must_use]
    pub const fn with_mirror_available(mut self, available: bool) -> Self {
        self.mirror_available = available;
        self
    }

    /// Expects the given resolved image.
    #[must_use]
    pub fn expect_resolved(mut self, resolved: impl Into<String>) -> Self {
        self.expect.resolved = Some(resolved.into());
        self
    }

    /// Expects the resolution to fail.
    #[must_use]
    pub const fn expect_error(mut self, error: ExpectedError) -> Self {
        self.expect.error = Some(error);
        self
    }

    /// Parses the requested image.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidImage`] if it does not parse.
    pub fn image(&self) -> Result<ImageReference> {
        self.image_name
            .parse()
            .map_err(|source| FixtureError::InvalidImage {
                name: self.name.clone(),
                source,
            })
    }

    /// Checks that the fixture can be run.
    ///
    /// # Errors
    ///
    /// Returns an error if the image does not parse, or the fixture expects
    /// both an error and outcome fields.
    pub fn validate(&self) -> Result<()> {
        self.image()?;

        let expect = &self.expect;
        let expects_outcome = expect.resolved.is_some()
            || expect.used_mirror.is_some()
            || expect.rule.is_some()
            || expect.collected.is_some();
        if expect.error.is_some() && expects_outcome {
            return Err(FixtureError::Invalid {
                name: self.name.clone(),
                message: "expects both an error and an outcome".to_string(),
            });
        }
        if let Some(resolved) = &expect.resolved {
            resolved
                .parse::<ImageReference>()
                .map_err(|source| FixtureError::InvalidImage {
                    name: self.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// A named collection of fixtures, as stored in one YAML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureSet {
    /// Name of the set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Host of the mirror registry the fixtures are written against.
    #[serde(default = "default_mirror_host")]
    pub mirror_host: String,

    /// The fixtures.
    pub fixtures: Vec<ResolutionFixture>,
}

fn default_mirror_host() -> String {
    crate::test_utils::MIRROR_HOST.to_string()
}

impl FixtureSet {
    /// Parses and validates a fixture set from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or any fixture is invalid.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let set: Self = serde_yaml::from_str(content)?;
        for fixture in &set.fixtures {
            fixture.validate()?;
        }
        Ok(set)
    }

    /// Loads a fixture set from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| FixtureError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Returns the number of fixtures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    /// Returns true if the set has no fixtures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

/// Directory holding the fixture files shipped with this crate.
#[must_use]
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Loads a fixture set shipped with this crate by file name.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid.
pub fn load_fixture_set(file_name: &str) -> Result<FixtureSet> {
    FixtureSet::from_yaml_file(fixtures_dir().join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_builder() {
        let fixture = ResolutionFixture::new("remote", "foo/bar:1.0")
            .with_description("remote host without mirror")
            .with_remote_host(true)
            .with_force_external(true)
            .with_mock_mirror(false)
            .expect_error(ExpectedError::MirrorRequiredButUnavailable);

        assert!(fixture.remote_host);
        assert!(fixture.force_external);
        assert!(!fixture.mirror_available);
        assert!(fixture.validate().is_ok());
    }

    #[test]
    fn test_fixture_yaml() {
        let yaml = r"
name: sample
fixtures:
  - name: legacy
    image: kyleaure/legacyimg:1.0
    mirror_available: true
    expect:
      rule: mirror_available
      used_mirror: true
";
        let set = FixtureSet::from_yaml_str(yaml).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.mirror_host, crate::test_utils::MIRROR_HOST);

        let fixture = &set.fixtures[0];
        assert!(fixture.mirror_available);
        assert!(!fixture.remote_host);
        assert_eq!(fixture.expect.rule, Some(ResolutionRule::MirrorAvailable));
        assert_eq!(fixture.expect.used_mirror, Some(true));
    }

    #[test]
    fn test_fixture_rejects_unknown_keys() {
        let yaml = "fixtures:\n  - name: x\n    image: foo:1\n    remote: true\n";
        assert!(matches!(
            FixtureSet::from_yaml_str(yaml),
            Err(FixtureError::Yaml(_))
        ));
    }

    #[test]
    fn test_fixture_rejects_bad_image() {
        let fixture = ResolutionFixture::new("bad", "Foo Bar");
        assert!(matches!(
            fixture.validate(),
            Err(FixtureError::InvalidImage { .. })
        ));
    }

    #[test]
    fn test_fixture_rejects_conflicting_expectation() {
        let fixture = ResolutionFixture::new("conflict", "foo:1")
            .expect_resolved("foo:1")
            .expect_error(ExpectedError::UnsupportedPrivateRegistry);
        assert!(matches!(
            fixture.validate(),
            Err(FixtureError::Invalid { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("set.yaml");
        fs::write(&path, "fixtures: []\n").unwrap();

        assert!(FixtureSet::from_yaml_file(&path).unwrap().is_empty());
        assert!(matches!(
            FixtureSet::from_yaml_file(temp_dir.path().join("missing.yaml")),
            Err(FixtureError::FileRead { .. })
        ));
    }

    #[test]
    fn test_bundled_scenarios_load() {
        let set = load_fixture_set("scenarios.yaml").unwrap();
        assert!(set.len() >= 6);
    }
}
