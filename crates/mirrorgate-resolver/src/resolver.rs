//! The resolver entry point.

use std::fmt;
use std::sync::Arc;

use mirrorgate_audit::{ImageAudit, NoopAudit};
use mirrorgate_core::{ImageReference, ResolutionOutcome, ResolutionRule};
use mirrorgate_registry::MirrorAvailability;
use tracing::{info, warn};

use crate::context::ResolveContext;
use crate::error::ResolveError;
use crate::policy::MirrorPolicy;
use crate::rules::{evaluate, RuleInput, Verdict};

/// Resolves image references against the mirror registry.
///
/// The resolver holds no mutable state; one instance can serve concurrent
/// callers. Mirror availability is owned by the injected gate.
#[derive(Clone)]
pub struct Resolver {
    gate: Arc<dyn MirrorAvailability>,
    audit: Arc<dyn ImageAudit>,
    policy: MirrorPolicy,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("gate", &self.gate)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Creates a resolver with the default policy and no audit collector.
    #[must_use]
    pub fn new(gate: Arc<dyn MirrorAvailability>) -> Self {
        Self {
            gate,
            audit: Arc::new(NoopAudit),
            policy: MirrorPolicy::default(),
        }
    }

    /// Hands every non-synthetic outcome to `audit`.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn ImageAudit>) -> Self {
        self.audit = audit;
        self
    }

    /// Replaces the naming policy.
    #[must_use]
    pub fn with_policy(mut self, policy: MirrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the naming policy.
    #[must_use]
    pub const fn policy(&self) -> &MirrorPolicy {
        &self.policy
    }

    /// Returns the availability gate.
    #[must_use]
    pub fn gate(&self) -> &dyn MirrorAvailability {
        self.gate.as_ref()
    }

    /// Resolves `original` under `context`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnsupportedPrivateRegistry`] if the image names
    /// a private-only registry, and
    /// [`ResolveError::MirrorRequiredButUnavailable`] if the deciding rule
    /// requires the mirror while the gate reports it unusable and mirroring
    /// is not mocked.
    pub fn resolve(
        &self,
        original: &ImageReference,
        context: &ResolveContext,
    ) -> Result<ResolutionOutcome, ResolveError> {
        let input = RuleInput::new(original, context, &self.policy, self.gate.as_ref());
        let (rule, verdict) = evaluate(&input);

        let outcome = match verdict {
            Verdict::Keep { reason } => ResolutionOutcome::keep(original.clone(), rule, reason),
            Verdict::Mirror { resolved, reason } => {
                ResolutionOutcome::mirrored(original.clone(), resolved, rule, reason)
            }
            Verdict::RejectPrivateRegistry => {
                return Err(ResolveError::UnsupportedPrivateRegistry {
                    image: original.clone(),
                    registry: original.registry().unwrap_or_default().to_string(),
                    pattern: self.policy.private_registry_pattern.clone(),
                });
            }
        };

        if outcome.used_mirror && !context.mock_mirror && !input.mirror_available() {
            return Err(ResolveError::MirrorRequiredButUnavailable {
                original: outcome.original,
                resolved: outcome.resolved,
                reason: outcome.reason,
                source: self.gate.setup_error(),
            });
        }

        let synthetic = rule == ResolutionRule::SyntheticImage;
        if synthetic {
            warn!(
                image = %original,
                "Cannot use the mirror registry for a programmatically built or committed image, \
                 consider using a pre-built image instead"
            );
        }

        if outcome.is_swapped() {
            info!(
                original = %outcome.original,
                resolved = %outcome.resolved,
                rule = %outcome.rule,
                reason = %outcome.reason,
                "Swapping docker image name"
            );
        } else {
            info!(
                original = %outcome.original,
                resolved = %outcome.resolved,
                rule = %outcome.rule,
                reason = %outcome.reason,
                "Keeping original image name"
            );
        }

        if synthetic {
            return Ok(outcome);
        }

        self.audit.collect(&outcome.original, &outcome.resolved);
        Ok(outcome.with_collected(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HostMode;
    use mirrorgate_audit::ImageCollector;
    use mirrorgate_registry::{AvailabilityGate, MirrorConfig, ProbeError};
    use std::error::Error as _;

    fn image(s: &str) -> ImageReference {
        s.parse().unwrap()
    }

    fn resolver(gate: AvailabilityGate) -> (Resolver, Arc<ImageCollector>) {
        let collector = Arc::new(ImageCollector::new());
        let resolver = Resolver::new(Arc::new(gate)).with_audit(collector.clone());
        (resolver, collector)
    }

    fn available() -> AvailabilityGate {
        AvailabilityGate::new(MirrorConfig::new("mirror.example.com"))
    }

    fn unavailable() -> AvailabilityGate {
        AvailabilityGate::forced_unavailable(MirrorConfig::new("mirror.example.com"), "offline")
    }

    #[test]
    fn test_synthetic_image_is_not_collected() {
        let (resolver, collector) = resolver(available());
        let outcome = resolver
            .resolve(
                &image("localhost/testcontainers/ryuk:latest"),
                &ResolveContext::new(HostMode::Local),
            )
            .unwrap();

        assert!(!outcome.used_mirror);
        assert!(!outcome.collected);
        assert!(outcome.reason.contains("synthetic"));
        assert!(collector.is_empty());
    }

    #[test]
    fn test_mirrored_outcome_is_collected() {
        let (resolver, collector) = resolver(available());
        let original = image("foo/bar:1.0");
        let outcome = resolver
            .resolve(&original, &ResolveContext::new(HostMode::Local))
            .unwrap();

        assert!(outcome.used_mirror);
        assert!(outcome.collected);
        assert_eq!(outcome.rule, ResolutionRule::MirrorAvailable);
        assert_eq!(
            collector.resolved_for(&original).as_deref(),
            Some("mirror.example.com/wasliberty-docker-remote/foo/bar:1.0")
        );
    }

    #[test]
    fn test_kept_outcome_is_collected() {
        let (resolver, collector) = resolver(unavailable());
        let original = image("foo/bar:1.0");
        let outcome = resolver
            .resolve(&original, &ResolveContext::new(HostMode::Local))
            .unwrap();

        assert_eq!(outcome.resolved, original);
        assert_eq!(outcome.rule, ResolutionRule::Default);
        assert_eq!(collector.resolved_for(&original).as_deref(), Some("foo/bar:1.0"));
    }

    #[test]
    fn test_private_registry_error() {
        let (resolver, collector) = resolver(available());
        let err = resolver
            .resolve(
                &image("artifactory.swg-devops.com/foo:1.0"),
                &ResolveContext::new(HostMode::Local),
            )
            .unwrap_err();

        assert!(matches!(
            &err,
            ResolveError::UnsupportedPrivateRegistry { registry, .. }
                if registry == "artifactory.swg-devops.com"
        ));
        assert!(collector.is_empty());
    }

    #[test]
    fn test_remote_host_requires_mirror() {
        let (resolver, collector) = resolver(unavailable());
        let err = resolver
            .resolve(&image("foo/bar:1.0"), &ResolveContext::new(HostMode::Remote))
            .unwrap_err();

        let ResolveError::MirrorRequiredButUnavailable { reason, source, .. } = &err else {
            panic!("unexpected error: {err}");
        };
        assert!(reason.contains("remote docker host"));
        assert!(matches!(
            source.as_deref(),
            Some(ProbeError::ForcedUnavailable { .. })
        ));
        assert!(err.source().is_some());
        assert!(collector.is_empty());
    }

    #[test]
    fn test_mock_mirror_skips_post_check() {
        let (resolver, _) = resolver(unavailable());
        let context = ResolveContext::new(HostMode::Remote).with_mock_mirror(true);
        let outcome = resolver.resolve(&image("foo/bar:1.0"), &context).unwrap();

        assert!(outcome.used_mirror);
        assert_eq!(outcome.rule, ResolutionRule::RemoteHost);
    }

    #[test]
    fn test_custom_policy() {
        let policy = MirrorPolicy {
            standard_mirror: "docker-remote".to_string(),
            ..MirrorPolicy::default()
        };
        let (resolver, _) = resolver(available());
        let resolver = resolver.with_policy(policy);
        let outcome = resolver
            .resolve(&image("foo/bar:1.0"), &ResolveContext::new(HostMode::Local))
            .unwrap();

        assert_eq!(
            outcome.resolved.to_string(),
            "mirror.example.com/docker-remote/foo/bar:1.0"
        );
        assert_eq!(resolver.policy().standard_mirror, "docker-remote");
        assert_eq!(resolver.gate().registry_host(), "mirror.example.com");
    }

    #[test]
    fn test_closure_audit_port() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let resolver = Resolver::new(Arc::new(available())).with_audit(Arc::new(
            move |original: &ImageReference, resolved: &ImageReference| {
                sink.lock().unwrap().push(format!("{original} -> {resolved}"));
            },
        ));

        let context = ResolveContext::new(HostMode::Local).with_force_external(true);
        resolver.resolve(&image("redis:7"), &context).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["redis:7 -> redis:7".to_string()]);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_synthetic_image_logs_keep_line() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        let (resolver, _) = resolver(available());
        tracing::subscriber::with_default(subscriber, || {
            resolver
                .resolve(
                    &image("localhost/testcontainers/ryuk:latest"),
                    &ResolveContext::new(HostMode::Local),
                )
                .unwrap();
        });

        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("pre-built image"));
        assert!(logs.contains("Keeping original image name"));
        assert!(logs.contains("resolved=localhost/testcontainers/ryuk:latest"));
        assert!(logs.contains("synthetic"));
    }

    #[test]
    fn test_debug_omits_audit() {
        let (resolver, _) = resolver(available());
        let debug = format!("{resolver:?}");
        assert!(debug.contains("Resolver"));
        assert!(debug.contains("policy"));
    }
}
