//! Image collection and post-run verification.

use std::collections::{BTreeMap, BTreeSet};

use mirrorgate_core::ImageReference;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::event::{ImageSubstitutionEvent, VerificationEvent};
use crate::logger::AuditLogger;

/// Receives every non-synthetic resolution.
///
/// Implementations must not fail the resolution; the call is fire-and-forget.
pub trait ImageAudit: Send + Sync {
    /// Records that `original` resolved to `resolved`.
    fn collect(&self, original: &ImageReference, resolved: &ImageReference);
}

impl<F> ImageAudit for F
where
    F: Fn(&ImageReference, &ImageReference) + Send + Sync,
{
    fn collect(&self, original: &ImageReference, resolved: &ImageReference) {
        self(original, resolved);
    }
}

/// Audit port that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAudit;

impl ImageAudit for NoopAudit {
    fn collect(&self, _original: &ImageReference, _resolved: &ImageReference) {}
}

/// Outcome of verifying collected images against an allow list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Number of distinct original images collected.
    pub collected: usize,

    /// Collected originals that are not on the allow list, sorted.
    pub unexpected: Vec<String>,
}

impl VerificationReport {
    /// Returns true if every collected image was expected.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unexpected.is_empty()
    }
}

/// Records resolved images for verification after a test run.
///
/// Pairs are keyed by the original's canonical name, so resolving the same
/// image twice records it once.
#[derive(Debug, Default)]
pub struct ImageCollector {
    images: Mutex<BTreeMap<String, String>>,
    logger: Option<AuditLogger>,
    correlation_id: Option<String>,
}

impl ImageCollector {
    /// Creates an empty collector without an audit logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits an event through `logger` for every newly collected image.
    #[must_use]
    pub fn with_logger(mut self, logger: AuditLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Tags emitted events with a run correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Returns the number of distinct images collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.lock().len()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.lock().is_empty()
    }

    /// Returns the collected `(original, resolved)` pairs, sorted by original.
    #[must_use]
    pub fn images(&self) -> Vec<(String, String)> {
        self.images
            .lock()
            .iter()
            .map(|(original, resolved)| (original.clone(), resolved.clone()))
            .collect()
    }

    /// Returns the resolved name recorded for `original`, if any.
    #[must_use]
    pub fn resolved_for(&self, original: &ImageReference) -> Option<String> {
        self.images.lock().get(&original.canonical_name()).cloned()
    }

    /// Checks the collected originals against an allow list.
    ///
    /// Allow list entries are compared by canonical name when they parse as
    /// image references, and verbatim otherwise.
    pub fn verify<S: AsRef<str>>(&self, expected: &[S]) -> VerificationReport {
        let allowed: BTreeSet<String> = expected
            .iter()
            .map(|entry| canonicalize(entry.as_ref()))
            .collect();

        let (collected, unexpected) = {
            let images = self.images.lock();
            let unexpected: Vec<String> = images
                .keys()
                .filter(|original| !allowed.contains(*original))
                .cloned()
                .collect();
            (images.len(), unexpected)
        };

        if !unexpected.is_empty() {
            warn!(
                count = unexpected.len(),
                images = ?unexpected,
                "Collected images are missing from the allow list"
            );
        }

        let mut event = VerificationEvent::new(collected, unexpected.clone());
        event.correlation_id.clone_from(&self.correlation_id);
        self.emit(&event);

        VerificationReport {
            collected,
            unexpected,
        }
    }

    fn emit<E: crate::event::AuditEvent>(&self, event: &E) {
        if let Some(logger) = &self.logger {
            if let Err(e) = logger.log(event) {
                warn!(event_type = event.event_type(), "Failed to emit audit event: {e}");
            }
        }
    }
}

impl ImageAudit for ImageCollector {
    fn collect(&self, original: &ImageReference, resolved: &ImageReference) {
        let key = original.canonical_name();
        let value = resolved.canonical_name();

        let previous = self.images.lock().insert(key, value.clone());
        if previous.as_deref() == Some(value.as_str()) {
            debug!(image = %original, "Image already collected");
            return;
        }

        let mut event = ImageSubstitutionEvent::new(original, resolved);
        event.correlation_id.clone_from(&self.correlation_id);
        self.emit(&event);
    }
}

/// Parses a newline-separated allow list; blank lines and `#` comments are skipped.
///
/// # Examples
///
/// ```rust
/// use mirrorgate_audit::parse_allow_list;
///
/// let entries = parse_allow_list("# databases\npostgres:16\n\n  redis:7  \n");
/// assert_eq!(entries, vec!["postgres:16", "redis:7"]);
/// ```
#[must_use]
pub fn parse_allow_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

fn canonicalize(entry: &str) -> String {
    let entry = entry.trim();
    entry
        .parse::<ImageReference>()
        .map_or_else(|_| entry.to_string(), |image| image.canonical_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::InMemoryBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn image(s: &str) -> ImageReference {
        s.parse().unwrap()
    }

    #[test]
    fn test_closure_is_an_audit_port() {
        let calls = AtomicUsize::new(0);
        let port = |_: &ImageReference, _: &ImageReference| {
            calls.fetch_add(1, Ordering::SeqCst);
        };

        port.collect(&image("a:1"), &image("a:1"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_collector_deduplicates_by_original() {
        let backend = Arc::new(InMemoryBackend::new());
        let collector = ImageCollector::new()
            .with_logger(AuditLogger::builder().with_backend(backend.clone()).build());

        let original = image("postgres:16");
        let resolved = image("mirror.example.com/std/postgres:16");
        collector.collect(&original, &resolved);
        collector.collect(&original, &resolved);

        assert_eq!(collector.len(), 1);
        assert_eq!(backend.events().len(), 1);
        assert_eq!(
            collector.resolved_for(&original).as_deref(),
            Some("mirror.example.com/std/postgres:16")
        );
    }

    #[test]
    fn test_collector_records_changed_resolution() {
        let backend = Arc::new(InMemoryBackend::new());
        let collector = ImageCollector::new()
            .with_logger(AuditLogger::builder().with_backend(backend.clone()).build());

        let original = image("postgres:16");
        collector.collect(&original, &original);
        collector.collect(&original, &image("mirror.example.com/std/postgres:16"));

        assert_eq!(collector.len(), 1);
        assert_eq!(backend.events().len(), 2);
    }

    #[test]
    fn test_verify_reports_unexpected_images() {
        let collector = ImageCollector::new();
        collector.collect(&image("postgres:16"), &image("postgres:16"));
        collector.collect(&image("redis"), &image("redis"));
        collector.collect(&image("rogue/tool:2"), &image("rogue/tool:2"));

        let report = collector.verify(&["postgres:16", "redis:latest"]);
        assert_eq!(report.collected, 3);
        assert_eq!(report.unexpected, vec!["rogue/tool:2".to_string()]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_verify_canonicalizes_allow_list() {
        let collector = ImageCollector::new();
        collector.collect(&image("redis"), &image("redis"));

        assert!(collector.verify(&["  redis  "]).is_clean());
    }

    #[test]
    fn test_verify_emits_event_with_correlation_id() {
        let backend = Arc::new(InMemoryBackend::new());
        let collector = ImageCollector::new()
            .with_logger(AuditLogger::builder().with_backend(backend.clone()).build())
            .with_correlation_id("run-7");

        let report = collector.verify::<&str>(&[]);
        assert!(report.is_clean());

        let events = backend.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].contains("\"correlation_id\":\"run-7\""));
    }

    #[test]
    fn test_parse_allow_list() {
        let entries = parse_allow_list("# comment\n\npostgres:16\n  redis:7 \n#redis:6\n");
        assert_eq!(entries, vec!["postgres:16", "redis:7"]);
    }

    #[test]
    fn test_noop_audit() {
        NoopAudit.collect(&image("a:1"), &image("a:1"));
    }
}
