//! Configuration types for the mirror registry.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the mirror registry host.
pub const ENV_MIRROR_HOST: &str = "MIRRORGATE_MIRROR_HOST";
/// Environment variable holding the mirror user name.
pub const ENV_MIRROR_USER: &str = "MIRRORGATE_MIRROR_USER";
/// Environment variable holding the mirror access token.
pub const ENV_MIRROR_TOKEN: &str = "MIRRORGATE_MIRROR_TOKEN";

/// Configuration for the mirror registry.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Registry host, optionally with a port (e.g., "mirror.example.com").
    pub host: String,

    /// Authentication configuration.
    pub auth: MirrorAuth,

    /// Request timeout for reachability probes.
    pub timeout: Duration,

    /// TLS configuration for reachability probes.
    pub tls: Option<TlsConfig>,

    /// User agent string.
    pub user_agent: String,
}

impl MirrorConfig {
    /// Creates a new mirror configuration for the given host.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorgate_registry::MirrorConfig;
    ///
    /// let config = MirrorConfig::new("mirror.example.com");
    /// assert_eq!(config.host, "mirror.example.com");
    /// assert!(config.is_configured());
    /// ```
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            auth: MirrorAuth::None,
            timeout: Duration::from_secs(30),
            tls: None,
            user_agent: format!("mirrorgate-registry/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Reads the configuration from `MIRRORGATE_MIRROR_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    ///
    /// Credentials are only used when both user and token are present.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorgate_registry::{MirrorAuth, MirrorConfig};
    ///
    /// let config = MirrorConfig::from_lookup(|key| match key {
    ///     "MIRRORGATE_MIRROR_HOST" => Some("mirror.example.com".to_string()),
    ///     "MIRRORGATE_MIRROR_USER" => Some("ci".to_string()),
    ///     "MIRRORGATE_MIRROR_TOKEN" => Some("secret".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.host, "mirror.example.com");
    /// assert!(matches!(config.auth, MirrorAuth::Basic { .. }));
    /// ```
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self::new(non_empty(ENV_MIRROR_HOST).unwrap_or_default());
        match (non_empty(ENV_MIRROR_USER), non_empty(ENV_MIRROR_TOKEN)) {
            (Some(username), Some(token)) => config.with_auth(MirrorAuth::basic(username, token)),
            _ => config,
        }
    }

    /// Sets the authentication method.
    #[must_use]
    pub fn with_auth(mut self, auth: MirrorAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the TLS configuration.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Returns true if a mirror host is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty()
    }
}

/// Authentication methods for mirror access.
#[derive(Clone)]
pub enum MirrorAuth {
    /// No credentials; the docker config must already know the mirror.
    None,

    /// User name and access token.
    Basic {
        /// Username.
        username: String,
        /// Access token or password.
        token: String,
    },
}

impl MirrorAuth {
    /// Creates basic authentication.
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorgate_registry::MirrorAuth;
    ///
    /// let auth = MirrorAuth::basic("user", "token");
    /// assert!(auth.has_credentials());
    /// ```
    #[must_use]
    pub fn basic(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            token: token.into(),
        }
    }

    /// Returns true if credentials are configured.
    #[must_use]
    pub const fn has_credentials(&self) -> bool {
        matches!(self, Self::Basic { .. })
    }
}

impl std::fmt::Debug for MirrorAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

/// TLS configuration for reachability probes.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Path to an extra CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,

    /// Whether to skip certificate verification (NOT recommended outside tests).
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    /// Creates a new TLS configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ca_cert: None,
            insecure_skip_verify: false,
        }
    }

    /// Sets the CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    /// Enables insecure mode (skips certificate verification).
    #[must_use]
    pub const fn insecure(mut self) -> Self {
        self.insecure_skip_verify = true;
        self
    }
}
