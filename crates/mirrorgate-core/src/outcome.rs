//! Resolution outcome types.
//!
//! This module defines the [`ResolutionOutcome`] structure that represents
//! the result of resolving one image reference, and the [`ResolutionRule`]
//! identifiers recorded in it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reference::ImageReference;

/// The rules of the resolution policy, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionRule {
    /// Programmatically built or committed image; never rewritten.
    SyntheticImage,
    /// Repository only exists in the mirror organization.
    MirrorOnlyRepository,
    /// Explicit registry matches the forbidden private host pattern.
    PrivateRegistry,
    /// Explicit registry chosen by the caller.
    ExplicitRegistry,
    /// The container host is remote and cannot reach the public registry.
    RemoteHost,
    /// Operator asked for the original registry.
    ForceExternal,
    /// The mirror is available, so it is used to avoid rate limits.
    MirrorAvailable,
    /// Mirror routing is mocked for tests.
    MockMirror,
    /// Nothing matched; keep the original.
    Default,
}

impl ResolutionRule {
    /// Every rule in evaluation order.
    pub const ALL: [Self; 9] = [
        Self::SyntheticImage,
        Self::MirrorOnlyRepository,
        Self::PrivateRegistry,
        Self::ExplicitRegistry,
        Self::RemoteHost,
        Self::ForceExternal,
        Self::MirrorAvailable,
        Self::MockMirror,
        Self::Default,
    ];

    /// Returns the 1-based priority of the rule.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::SyntheticImage => 1,
            Self::MirrorOnlyRepository => 2,
            Self::PrivateRegistry => 3,
            Self::ExplicitRegistry => 4,
            Self::RemoteHost => 5,
            Self::ForceExternal => 6,
            Self::MirrorAvailable => 7,
            Self::MockMirror => 8,
            Self::Default => 9,
        }
    }

    /// Returns the stable identifier of the rule.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SyntheticImage => "synthetic_image",
            Self::MirrorOnlyRepository => "mirror_only_repository",
            Self::PrivateRegistry => "private_registry",
            Self::ExplicitRegistry => "explicit_registry",
            Self::RemoteHost => "remote_host",
            Self::ForceExternal => "force_external",
            Self::MirrorAvailable => "mirror_available",
            Self::MockMirror => "mock_mirror",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ResolutionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of resolving an image reference.
///
/// When `used_mirror` is true, `resolved` points at the mirror registry.
///
/// # Examples
///
/// ```rust
/// use mirrorgate_core::{ImageReference, ResolutionOutcome, ResolutionRule};
///
/// let original: ImageReference = "foo/bar:1.0".parse().unwrap();
/// let outcome = ResolutionOutcome::keep(
///     original.clone(),
///     ResolutionRule::Default,
///     "Default behavior: use default registry.",
/// );
/// assert!(!outcome.used_mirror);
/// assert!(!outcome.is_swapped());
/// assert_eq!(outcome.resolved, original);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    /// The requested reference.
    pub original: ImageReference,

    /// The reference to pull.
    pub resolved: ImageReference,

    /// Whether the resolved reference goes through the mirror registry.
    pub used_mirror: bool,

    /// Human-readable justification.
    pub reason: String,

    /// Rule that produced this outcome.
    pub rule: ResolutionRule,

    /// Whether the outcome was handed to the audit collector.
    pub collected: bool,
}

impl ResolutionOutcome {
    /// Creates an outcome that keeps the original reference.
    #[must_use]
    pub fn keep(original: ImageReference, rule: ResolutionRule, reason: impl Into<String>) -> Self {
        Self {
            resolved: original.clone(),
            original,
            used_mirror: false,
            reason: reason.into(),
            rule,
            collected: false,
        }
    }

    /// Creates an outcome routed through the mirror registry.
    #[must_use]
    pub fn mirrored(
        original: ImageReference,
        resolved: ImageReference,
        rule: ResolutionRule,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            original,
            resolved,
            used_mirror: true,
            reason: reason.into(),
            rule,
            collected: false,
        }
    }

    /// Marks the outcome as handed to the audit collector.
    #[must_use]
    pub const fn with_collected(mut self, collected: bool) -> Self {
        self.collected = collected;
        self
    }

    /// Returns true if the resolved reference differs from the original.
    #[must_use]
    pub fn is_swapped(&self) -> bool {
        self.original != self.resolved
    }
}
