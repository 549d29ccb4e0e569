//! Assertion helpers for resolver tests.

use mirrorgate_core::{ImageReference, ResolutionOutcome};

/// Mirror host used by the bundled fixtures.
pub const MIRROR_HOST: &str = "mirror.example.com";

/// Parses an image reference, panicking on malformed input.
///
/// # Panics
///
/// Panics if `reference` is not a valid image reference.
#[track_caller]
#[must_use]
pub fn image(reference: &str) -> ImageReference {
    reference
        .parse()
        .unwrap_or_else(|e| panic!("invalid test image '{reference}': {e}"))
}

/// Asserts that the outcome routes through the mirror at `host`.
///
/// # Panics
///
/// Panics if the outcome does not use the mirror or names another registry.
#[track_caller]
pub fn assert_mirrored(outcome: &ResolutionOutcome, host: &str) {
    assert!(
        outcome.used_mirror,
        "Expected {} to use the mirror, but it was kept ({})",
        outcome.original, outcome.reason
    );
    assert_eq!(
        outcome.resolved.registry(),
        Some(host),
        "Expected {} to resolve onto {host}, got {}",
        outcome.original,
        outcome.resolved
    );
}

/// Asserts that the outcome keeps the original reference.
///
/// # Panics
///
/// Panics if the outcome uses the mirror or rewrites the reference.
#[track_caller]
pub fn assert_unchanged(outcome: &ResolutionOutcome) {
    assert!(
        !outcome.used_mirror && outcome.resolved == outcome.original,
        "Expected {} to be kept, but it resolved to {} ({})",
        outcome.original,
        outcome.resolved,
        outcome.reason
    );
}
