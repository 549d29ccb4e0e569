//! The ordered resolution rules.
//!
//! Each [`ResolutionRule`] is a predicate paired with an action. Rules are
//! evaluated in [`ResolutionRule::ALL`] order and the first one that
//! applies decides the outcome.

use std::cell::OnceCell;

use mirrorgate_core::{ImageReference, ResolutionRule};
use mirrorgate_registry::MirrorAvailability;

use crate::context::{HostMode, ResolveContext};
use crate::policy::MirrorPolicy;

/// Everything a rule may look at for one resolution.
pub(crate) struct RuleInput<'a> {
    pub original: &'a ImageReference,
    pub context: &'a ResolveContext,
    pub policy: &'a MirrorPolicy,
    gate: &'a dyn MirrorAvailability,
    available: OnceCell<bool>,
}

impl<'a> RuleInput<'a> {
    pub fn new(
        original: &'a ImageReference,
        context: &'a ResolveContext,
        policy: &'a MirrorPolicy,
        gate: &'a dyn MirrorAvailability,
    ) -> Self {
        Self {
            original,
            context,
            policy,
            gate,
            available: OnceCell::new(),
        }
    }

    /// Asks the gate at most once per resolution.
    pub fn mirror_available(&self) -> bool {
        *self.available.get_or_init(|| self.gate.is_available())
    }

    /// The original routed through its mirror: `host/mirror-name/repository`.
    fn routed(&self) -> ImageReference {
        self.original
            .with_repository_prefix(self.policy.mirror_name(self.original))
            .with_registry(self.gate.registry_host())
    }
}

/// What a matching rule decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Use the original reference.
    Keep { reason: &'static str },
    /// Use the mirror reference.
    Mirror {
        resolved: ImageReference,
        reason: &'static str,
    },
    /// The reference may not be used at all.
    RejectPrivateRegistry,
}

/// Returns true if `rule` matches the input.
pub(crate) fn applies(rule: ResolutionRule, input: &RuleInput<'_>) -> bool {
    let original = input.original;
    match rule {
        ResolutionRule::SyntheticImage => input.policy.is_synthetic(original),
        ResolutionRule::MirrorOnlyRepository => input.policy.is_mirror_only(original),
        ResolutionRule::PrivateRegistry => input.policy.is_private_registry(original),
        ResolutionRule::ExplicitRegistry => original.has_registry(),
        ResolutionRule::RemoteHost => input.context.host_mode == HostMode::Remote,
        ResolutionRule::ForceExternal => input.context.force_external,
        ResolutionRule::MirrorAvailable => input.mirror_available(),
        ResolutionRule::MockMirror => input.context.mock_mirror,
        ResolutionRule::Default => true,
    }
}

/// Returns what `rule` decides. Only meaningful once [`applies`] is true.
pub(crate) fn decide(rule: ResolutionRule, input: &RuleInput<'_>) -> Verdict {
    match rule {
        ResolutionRule::SyntheticImage => Verdict::Keep {
            reason: "Image name is known to be synthetic, cannot use the mirror registry.",
        },
        ResolutionRule::MirrorOnlyRepository => Verdict::Mirror {
            resolved: input.original.with_registry(input.gate.registry_host()),
            reason: "This image only exists in the mirror registry, must use the mirror registry.",
        },
        ResolutionRule::PrivateRegistry => Verdict::RejectPrivateRegistry,
        ResolutionRule::ExplicitRegistry => Verdict::Keep {
            reason: "Image name is explicitly set with a registry, cannot modify the registry.",
        },
        ResolutionRule::RemoteHost => Verdict::Mirror {
            resolved: input.routed(),
            reason: "Using a remote docker host, must use the mirror registry.",
        },
        ResolutionRule::ForceExternal => Verdict::Keep {
            reason: "Force external was set to true, must use the original image name.",
        },
        ResolutionRule::MirrorAvailable => Verdict::Mirror {
            resolved: input.routed(),
            reason: "The mirror registry was available.",
        },
        ResolutionRule::MockMirror => Verdict::Mirror {
            resolved: input.routed(),
            reason: "Mocking mirror registry behavior.",
        },
        ResolutionRule::Default => Verdict::Keep {
            reason: "Default behavior: use the default docker registry.",
        },
    }
}

/// Evaluates the rules in priority order and returns the first match.
pub(crate) fn evaluate(input: &RuleInput<'_>) -> (ResolutionRule, Verdict) {
    let rule = ResolutionRule::ALL
        .into_iter()
        .find(|rule| applies(*rule, input))
        .unwrap_or(ResolutionRule::Default);
    (rule, decide(rule, input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorgate_registry::{AvailabilityGate, MirrorConfig};

    const HOST: &str = "mirror.example.com";

    fn image(s: &str) -> ImageReference {
        s.parse().unwrap()
    }

    fn available() -> AvailabilityGate {
        AvailabilityGate::new(MirrorConfig::new(HOST))
    }

    fn unavailable() -> AvailabilityGate {
        AvailabilityGate::forced_unavailable(MirrorConfig::new(HOST), "down")
    }

    fn run(reference: &str, context: ResolveContext, gate: &AvailabilityGate) -> (ResolutionRule, Verdict) {
        let original = image(reference);
        let policy = MirrorPolicy::default();
        let input = RuleInput::new(&original, &context, &policy, gate);
        evaluate(&input)
    }

    fn local() -> ResolveContext {
        ResolveContext::new(HostMode::Local)
    }

    #[test]
    fn test_synthetic_image_wins_over_everything() {
        let context = ResolveContext::new(HostMode::Remote).with_mock_mirror(true);
        let (rule, verdict) = run("localhost/testcontainers/ryuk:latest", context, &available());
        assert_eq!(rule, ResolutionRule::SyntheticImage);
        assert!(matches!(verdict, Verdict::Keep { reason } if reason.contains("synthetic")));
    }

    #[test]
    fn test_committed_image_is_synthetic() {
        let (rule, _) = run("sha256:1.0", local(), &available());
        assert_eq!(rule, ResolutionRule::SyntheticImage);
    }

    #[test]
    fn test_mirror_only_swaps_registry_only() {
        let context = local().with_force_external(true);
        let (rule, verdict) = run("wasliberty-something/foo:1.0", context, &unavailable());
        assert_eq!(rule, ResolutionRule::MirrorOnlyRepository);
        assert_eq!(
            verdict,
            Verdict::Mirror {
                resolved: image("mirror.example.com/wasliberty-something/foo:1.0"),
                reason: "This image only exists in the mirror registry, must use the mirror registry.",
            }
        );
    }

    #[test]
    fn test_private_registry_is_rejected() {
        let (rule, verdict) = run("artifactory.swg-devops.com/foo:1.0", local(), &available());
        assert_eq!(rule, ResolutionRule::PrivateRegistry);
        assert_eq!(verdict, Verdict::RejectPrivateRegistry);
    }

    #[test]
    fn test_explicit_registry_is_kept() {
        let context = ResolveContext::new(HostMode::Remote);
        let (rule, verdict) = run("myregistry.example.com/foo:1.0", context, &available());
        assert_eq!(rule, ResolutionRule::ExplicitRegistry);
        assert!(matches!(verdict, Verdict::Keep { .. }));
    }

    #[test]
    fn test_remote_host_precedes_force_external() {
        let context = ResolveContext::new(HostMode::Remote).with_force_external(true);
        let (rule, verdict) = run("foo/bar:1.0", context, &unavailable());
        assert_eq!(rule, ResolutionRule::RemoteHost);
        assert!(matches!(
            verdict,
            Verdict::Mirror { resolved, .. }
                if resolved == image("mirror.example.com/wasliberty-docker-remote/foo/bar:1.0")
        ));
    }

    #[test]
    fn test_force_external_precedes_availability() {
        let (rule, verdict) = run("foo/bar:1.0", local().with_force_external(true), &available());
        assert_eq!(rule, ResolutionRule::ForceExternal);
        assert!(matches!(verdict, Verdict::Keep { .. }));
    }

    #[test]
    fn test_available_mirror_routes_legacy_prefix() {
        let (rule, verdict) = run("kyleaure/legacyimg:1.0", local(), &available());
        assert_eq!(rule, ResolutionRule::MirrorAvailable);
        assert!(matches!(
            verdict,
            Verdict::Mirror { resolved, .. }
                if resolved.to_string()
                    == "mirror.example.com/wasliberty-infrastructure-docker/kyleaure/legacyimg:1.0"
        ));
    }

    #[test]
    fn test_mock_mirror_when_unavailable() {
        let (rule, verdict) = run("foo/bar:1.0", local().with_mock_mirror(true), &unavailable());
        assert_eq!(rule, ResolutionRule::MockMirror);
        assert!(matches!(verdict, Verdict::Mirror { .. }));
    }

    #[test]
    fn test_default_keeps_original() {
        let (rule, verdict) = run("foo/bar:1.0", local(), &unavailable());
        assert_eq!(rule, ResolutionRule::Default);
        assert!(matches!(verdict, Verdict::Keep { reason } if reason.starts_with("Default")));
    }

    #[test]
    fn test_digest_reference_is_routed() {
        let digest = format!("foo/bar@sha256:{}", "a".repeat(64));
        let (_, verdict) = run(&digest, local(), &available());
        let Verdict::Mirror { resolved, .. } = verdict else {
            panic!("expected mirror verdict");
        };
        assert_eq!(resolved.digest(), image(&digest).digest());
        assert_eq!(resolved.registry(), Some(HOST));
    }
}
