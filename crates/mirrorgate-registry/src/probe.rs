//! Setup probes that decide whether the mirror registry is usable.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use base64::Engine;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{MirrorAuth, MirrorConfig};
use crate::error::ProbeError;

/// A single setup step run by the availability gate.
pub trait MirrorProbe: Send + Sync + Debug {
    /// Checks or prepares the mirror.
    ///
    /// # Errors
    ///
    /// Returns the reason the mirror cannot be used.
    fn probe(&self, config: &MirrorConfig) -> Result<(), ProbeError>;

    /// Returns the probe name for identification.
    fn name(&self) -> &'static str;
}

/// Registers the mirror credentials in the docker client config.
///
/// The container runtime reads `auths` from this file when pulling, so a
/// mirror it has no credentials for is unusable.
#[derive(Debug, Clone)]
pub struct DockerConfigProbe {
    path: PathBuf,
}

impl DockerConfigProbe {
    /// Creates a probe for an explicit `config.json` path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Locates `config.json` through `DOCKER_CONFIG`, falling back to `~/.docker`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::DockerConfigUnresolved`] if neither is available.
    pub fn from_env() -> Result<Self, ProbeError> {
        let dir = std::env::var_os("DOCKER_CONFIG")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".docker")))
            .ok_or(ProbeError::DockerConfigUnresolved)?;
        Ok(Self::new(dir.join("config.json")))
    }

    /// Returns the config file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Map<String, Value>, ProbeError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(ProbeError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(ProbeError::InvalidDockerConfig {
                path: self.path.clone(),
                message: "top-level value is not an object".to_string(),
            }),
        }
    }

    fn write_document(&self, document: &Map<String, Value>) -> Result<(), ProbeError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ProbeError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(document)?;
        std::fs::write(&self.path, json).map_err(|e| ProbeError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

impl MirrorProbe for DockerConfigProbe {
    fn probe(&self, config: &MirrorConfig) -> Result<(), ProbeError> {
        let mut document = self.read_document()?;

        let auths = document
            .entry("auths")
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(auths) = auths else {
            return Err(ProbeError::InvalidDockerConfig {
                path: self.path.clone(),
                message: "'auths' is not an object".to_string(),
            });
        };

        match &config.auth {
            MirrorAuth::Basic { username, token } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{token}"));
                let entry = serde_json::json!({ "auth": encoded });
                if auths.get(&config.host) == Some(&entry) {
                    debug!(host = %config.host, path = %self.path.display(), "Docker config already has mirror credentials");
                    return Ok(());
                }
                auths.insert(config.host.clone(), entry);
                self.write_document(&document)?;
                debug!(host = %config.host, path = %self.path.display(), "Registered mirror credentials in docker config");
                Ok(())
            }
            MirrorAuth::None => {
                if auths.contains_key(&config.host) {
                    Ok(())
                } else {
                    Err(ProbeError::MissingDockerAuth {
                        host: config.host.clone(),
                        path: self.path.clone(),
                    })
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "docker_config"
    }
}

/// Checks that the mirror answers the OCI distribution base endpoint.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    scheme: String,
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpProbe {
    /// Creates an HTTPS probe.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scheme: "https".to_string(),
        }
    }

    /// Uses a different URL scheme (e.g. `http` for a local test registry).
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Returns the URL probed for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidUrl`] if the host does not form a valid URL.
    pub fn endpoint(&self, config: &MirrorConfig) -> Result<url::Url, ProbeError> {
        let raw = format!("{}://{}/v2/", self.scheme, config.host);
        url::Url::parse(&raw).map_err(|_| ProbeError::InvalidUrl { url: raw })
    }

    fn build_client(config: &MirrorConfig) -> Result<reqwest::blocking::Client, ProbeError> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent);

        if let Some(ref tls) = config.tls {
            if tls.insecure_skip_verify {
                builder = builder.danger_accept_invalid_certs(true);
            }

            if let Some(ref ca_cert) = tls.ca_cert {
                let cert_pem = std::fs::read(ca_cert).map_err(|e| ProbeError::Io {
                    path: ca_cert.clone(),
                    source: e,
                })?;
                let invalid = |message: String| ProbeError::InvalidCertificate {
                    path: ca_cert.clone(),
                    message,
                };
                let certs = reqwest::Certificate::from_pem_bundle(&cert_pem)
                    .map_err(|e| invalid(e.to_string()))?;
                if certs.is_empty() {
                    return Err(invalid("no PEM certificates found".to_string()));
                }
                for cert in certs {
                    builder = builder.add_root_certificate(cert);
                }
            }
        }

        builder.build().map_err(ProbeError::from)
    }
}

impl MirrorProbe for HttpProbe {
    fn probe(&self, config: &MirrorConfig) -> Result<(), ProbeError> {
        let endpoint = self.endpoint(config)?;
        let client = Self::build_client(config)?;

        let mut request = client.get(endpoint.clone());
        if let MirrorAuth::Basic { username, token } = &config.auth {
            request = request.basic_auth(username, Some(token));
        }

        let response = request.send().map_err(|e| ProbeError::ConnectionFailed {
            url: endpoint.to_string(),
            source: e,
        })?;
        let status = response.status();
        debug!(url = %endpoint, status = status.as_u16(), "Mirror registry responded");

        if status.is_success() {
            Ok(())
        } else if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            Err(ProbeError::AuthenticationFailed {
                host: config.host.clone(),
                status: status.as_u16(),
            })
        } else {
            Err(ProbeError::HttpError {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TlsConfig;
    use tempfile::TempDir;

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_docker_config_writes_credentials() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docker").join("config.json");
        let probe = DockerConfigProbe::new(&path);
        let config =
            MirrorConfig::new("mirror.example.com").with_auth(MirrorAuth::basic("ci", "secret"));

        probe.probe(&config).unwrap();

        let json = read_json(&path);
        let expected = base64::engine::general_purpose::STANDARD.encode("ci:secret");
        assert_eq!(json["auths"]["mirror.example.com"]["auth"], expected.as_str());
    }

    #[test]
    fn test_docker_config_preserves_other_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"auths":{"ghcr.io":{"auth":"abc"}},"credsStore":"desktop"}"#,
        )
        .unwrap();

        let config =
            MirrorConfig::new("mirror.example.com").with_auth(MirrorAuth::basic("ci", "secret"));
        DockerConfigProbe::new(&path).probe(&config).unwrap();

        let json = read_json(&path);
        assert_eq!(json["auths"]["ghcr.io"]["auth"], "abc");
        assert_eq!(json["credsStore"], "desktop");
        assert!(json["auths"]["mirror.example.com"].is_object());
    }

    #[test]
    fn test_docker_config_without_credentials_requires_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let config = MirrorConfig::new("mirror.example.com");

        let err = DockerConfigProbe::new(&path).probe(&config).unwrap_err();
        assert!(matches!(err, ProbeError::MissingDockerAuth { .. }));
        assert!(!path.exists());

        std::fs::write(&path, r#"{"auths":{"mirror.example.com":{}}}"#).unwrap();
        assert!(DockerConfigProbe::new(&path).probe(&config).is_ok());
    }

    #[test]
    fn test_docker_config_rejects_non_object() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "[]").unwrap();

        let config = MirrorConfig::new("mirror.example.com");
        let err = DockerConfigProbe::new(&path).probe(&config).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidDockerConfig { .. }));
    }

    #[test]
    fn test_docker_config_rejects_bad_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let config = MirrorConfig::new("mirror.example.com");
        let err = DockerConfigProbe::new(&path).probe(&config).unwrap_err();
        assert!(matches!(err, ProbeError::Json { .. }));
    }

    #[test]
    fn test_http_probe_endpoint() {
        let config = MirrorConfig::new("mirror.example.com:8443");
        let url = HttpProbe::new().endpoint(&config).unwrap();
        assert_eq!(url.as_str(), "https://mirror.example.com:8443/v2/");

        let url = HttpProbe::new().with_scheme("http").endpoint(&config).unwrap();
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn test_http_probe_invalid_host() {
        let config = MirrorConfig::new("bad host");
        let err = HttpProbe::new().endpoint(&config).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidUrl { .. }));
    }

    #[test]
    fn test_http_probe_connection_refused() {
        let config = MirrorConfig::new("127.0.0.1:9")
            .with_timeout(std::time::Duration::from_secs(2));
        let err = HttpProbe::new()
            .with_scheme("http")
            .probe(&config)
            .unwrap_err();
        assert!(matches!(err, ProbeError::ConnectionFailed { .. }));
    }

    #[test]
    fn test_http_client_rejects_bad_ca_certificate() {
        let temp_dir = TempDir::new().unwrap();
        let ca_cert = temp_dir.path().join("ca.pem");
        std::fs::write(&ca_cert, "not a certificate").unwrap();

        let config = MirrorConfig::new("127.0.0.1:9")
            .with_tls(TlsConfig::new().with_ca_cert(&ca_cert));
        let err = HttpProbe::new().probe(&config).unwrap_err();

        assert!(matches!(err, ProbeError::InvalidCertificate { ref path, .. } if path == &ca_cert));
        assert!(err.to_string().contains("Invalid CA certificate"));
    }

    #[test]
    fn test_probe_names() {
        assert_eq!(DockerConfigProbe::new("x").name(), "docker_config");
        assert_eq!(HttpProbe::new().name(), "http");
    }
}
