//! The mirror availability gate.

use std::fmt::Debug;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{MirrorConfig, ENV_MIRROR_HOST};
use crate::error::ProbeError;
use crate::probe::{DockerConfigProbe, HttpProbe, MirrorProbe};

/// Read-only view of mirror availability consumed by the resolver.
pub trait MirrorAvailability: Send + Sync + Debug {
    /// Returns true if images can be pulled through the mirror.
    fn is_available(&self) -> bool;

    /// Returns the mirror registry host.
    ///
    /// Only meaningful when [`is_available`](Self::is_available) is true.
    fn registry_host(&self) -> &str;

    /// Returns the error captured when the mirror was found unusable.
    fn setup_error(&self) -> Option<Arc<ProbeError>>;
}

/// Snapshot of the mirror's usability, established once.
#[derive(Debug, Clone)]
pub struct AvailabilityState {
    available: bool,
    setup_error: Option<Arc<ProbeError>>,
}

impl AvailabilityState {
    /// A usable mirror.
    #[must_use]
    pub const fn available() -> Self {
        Self {
            available: true,
            setup_error: None,
        }
    }

    /// An unusable mirror and the reason.
    #[must_use]
    pub fn unavailable(error: ProbeError) -> Self {
        Self {
            available: false,
            setup_error: Some(Arc::new(error)),
        }
    }

    /// Returns true if the mirror is usable.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    /// Returns the captured setup error.
    #[must_use]
    pub fn setup_error(&self) -> Option<Arc<ProbeError>> {
        self.setup_error.clone()
    }
}

/// Decides once whether the mirror registry is usable.
///
/// Probes run in order on first query and stop at the first failure.
/// Concurrent first callers wait for the single probe run; later callers
/// read the cached state.
///
/// # Examples
///
/// ```rust
/// use mirrorgate_registry::{AvailabilityGate, MirrorAvailability, MirrorConfig};
///
/// let gate = AvailabilityGate::forced_unavailable(
///     MirrorConfig::new("mirror.example.com"),
///     "maintenance window",
/// );
/// assert!(!gate.is_available());
/// assert!(gate.setup_error().unwrap().to_string().contains("maintenance window"));
/// ```
#[derive(Debug)]
pub struct AvailabilityGate {
    config: MirrorConfig,
    probes: Vec<Box<dyn MirrorProbe>>,
    state: OnceCell<AvailabilityState>,
}

impl AvailabilityGate {
    /// Creates a gate with no probes; it is available iff a host is configured.
    #[must_use]
    pub fn new(config: MirrorConfig) -> Self {
        Self {
            config,
            probes: Vec::new(),
            state: OnceCell::new(),
        }
    }

    /// Creates a gate from the environment with the docker config and HTTP probes.
    ///
    /// A docker config location that cannot be resolved pins the gate
    /// unavailable with that error.
    #[must_use]
    pub fn from_env() -> Self {
        let config = MirrorConfig::from_env();
        match DockerConfigProbe::from_env() {
            Ok(docker) => Self::new(config)
                .with_probe(docker)
                .with_probe(HttpProbe::new()),
            Err(error) => Self::with_state(config, AvailabilityState::unavailable(error)),
        }
    }

    /// Creates a gate pinned unavailable with a diagnostic reason.
    #[must_use]
    pub fn forced_unavailable(config: MirrorConfig, reason: impl Into<String>) -> Self {
        Self::with_state(
            config,
            AvailabilityState::unavailable(ProbeError::ForcedUnavailable {
                reason: reason.into(),
            }),
        )
    }

    fn with_state(config: MirrorConfig, state: AvailabilityState) -> Self {
        Self {
            config,
            probes: Vec::new(),
            state: OnceCell::with_value(state),
        }
    }

    /// Appends a probe.
    #[must_use]
    pub fn with_probe(mut self, probe: impl MirrorProbe + 'static) -> Self {
        self.probes.push(Box::new(probe));
        self
    }

    /// Returns the mirror configuration.
    #[must_use]
    pub const fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Returns the number of configured probes.
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// Returns the availability state, probing on first use.
    pub fn state(&self) -> &AvailabilityState {
        self.state.get_or_init(|| self.run_probes())
    }

    /// Returns true if the state has already been established.
    #[must_use]
    pub fn is_probed(&self) -> bool {
        self.state.get().is_some()
    }

    fn run_probes(&self) -> AvailabilityState {
        if !self.config.is_configured() {
            warn!("No mirror registry host configured, mirror is unavailable");
            return AvailabilityState::unavailable(ProbeError::NotConfigured {
                setting: ENV_MIRROR_HOST.to_string(),
            });
        }

        for probe in &self.probes {
            debug!(probe = probe.name(), host = %self.config.host, "Running mirror probe");
            if let Err(error) = probe.probe(&self.config) {
                warn!(
                    probe = probe.name(),
                    host = %self.config.host,
                    error = %error,
                    "Mirror registry is unavailable"
                );
                return AvailabilityState::unavailable(error);
            }
        }

        info!(host = %self.config.host, "Mirror registry is available");
        AvailabilityState::available()
    }
}

impl MirrorAvailability for AvailabilityGate {
    fn is_available(&self) -> bool {
        self.state().is_available()
    }

    fn registry_host(&self) -> &str {
        &self.config.host
    }

    fn setup_error(&self) -> Option<Arc<ProbeError>> {
        self.state().setup_error()
    }
}
