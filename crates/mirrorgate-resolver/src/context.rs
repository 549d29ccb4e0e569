//! Per-resolution environment flags.

/// Environment variable that opts out of the mirror.
pub const ENV_FORCE_EXTERNAL: &str = "MIRRORGATE_FORCE_EXTERNAL";
/// Environment variable that mocks mirror routing in tests.
pub const ENV_MOCK_MIRROR: &str = "MIRRORGATE_MOCK_MIRROR";
/// Environment variable selecting the container daemon.
pub const ENV_DOCKER_HOST: &str = "DOCKER_HOST";

/// Where the container daemon runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HostMode {
    /// The local daemon, reached through a unix socket or named pipe.
    #[default]
    Local,
    /// A remote daemon configured through `DOCKER_HOST`.
    Remote,
}

impl HostMode {
    /// Derives the host mode from a `DOCKER_HOST` value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mirrorgate_resolver::HostMode;
    ///
    /// assert_eq!(HostMode::from_docker_host(None), HostMode::Local);
    /// assert_eq!(HostMode::from_docker_host(Some("unix:///var/run/docker.sock")), HostMode::Local);
    /// assert_eq!(HostMode::from_docker_host(Some("tcp://10.0.0.5:2376")), HostMode::Remote);
    /// ```
    #[must_use]
    pub fn from_docker_host(docker_host: Option<&str>) -> Self {
        let Some(value) = docker_host.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::Local;
        };
        let lower = value.to_ascii_lowercase();
        if ["tcp://", "ssh://", "http://", "https://"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
        {
            Self::Remote
        } else {
            Self::Local
        }
    }
}

/// Flags that influence a resolution, read once from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolveContext {
    /// Where the container daemon runs.
    pub host_mode: HostMode,
    /// Operator override: keep original references when no safety rule applies.
    pub force_external: bool,
    /// Test-only override: route through the mirror regardless of availability.
    pub mock_mirror: bool,
}

impl ResolveContext {
    /// Creates a context with both overrides off.
    #[must_use]
    pub const fn new(host_mode: HostMode) -> Self {
        Self {
            host_mode,
            force_external: false,
            mock_mirror: false,
        }
    }

    /// Reads the context from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the context through an arbitrary variable lookup.
    ///
    /// Both overrides are only honored when set to `true`, ignoring case.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host_mode: HostMode::from_docker_host(lookup(ENV_DOCKER_HOST).as_deref()),
            force_external: is_true(lookup(ENV_FORCE_EXTERNAL).as_deref()),
            mock_mirror: is_true(lookup(ENV_MOCK_MIRROR).as_deref()),
        }
    }

    /// Sets the force-external override.
    #[must_use]
    pub const fn with_force_external(mut self, force_external: bool) -> Self {
        self.force_external = force_external;
        self
    }

    /// Sets the mock-mirror override.
    #[must_use]
    pub const fn with_mock_mirror(mut self, mock_mirror: bool) -> Self {
        self.mock_mirror = mock_mirror;
        self
    }
}

fn is_true(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}
