//! In-memory stand-ins for the availability gate and the audit collector.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mirrorgate_audit::ImageAudit;
use mirrorgate_core::ImageReference;
use mirrorgate_registry::{MirrorAvailability, ProbeError};
use parking_lot::Mutex;

/// A gate with a fixed answer that counts how often it is asked.
///
/// # Examples
///
/// ```rust
/// use mirrorgate_registry::MirrorAvailability;
/// use mirrorgate_test::StaticAvailability;
///
/// let gate = StaticAvailability::unavailable("mirror.example.com", "offline");
/// assert!(!gate.is_available());
/// assert_eq!(gate.queries(), 1);
/// ```
#[derive(Debug)]
pub struct StaticAvailability {
    host: String,
    available: bool,
    setup_error: Option<Arc<ProbeError>>,
    queries: AtomicUsize,
}

impl StaticAvailability {
    /// A usable mirror at `host`.
    #[must_use]
    pub fn available(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            available: true,
            setup_error: None,
            queries: AtomicUsize::new(0),
        }
    }

    /// An unusable mirror at `host` whose setup failed with `reason`.
    #[must_use]
    pub fn unavailable(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            available: false,
            setup_error: Some(Arc::new(ProbeError::ForcedUnavailable {
                reason: reason.into(),
            })),
            queries: AtomicUsize::new(0),
        }
    }

    /// Picks [`available`](Self::available) or [`unavailable`](Self::unavailable).
    #[must_use]
    pub fn with_state(host: impl Into<String>, available: bool) -> Self {
        if available {
            Self::available(host)
        } else {
            Self::unavailable(host, "mirror disabled for this test")
        }
    }

    /// Returns how many times [`MirrorAvailability::is_available`] was called.
    #[must_use]
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl MirrorAvailability for StaticAvailability {
    fn is_available(&self) -> bool {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.available
    }

    fn registry_host(&self) -> &str {
        &self.host
    }

    fn setup_error(&self) -> Option<Arc<ProbeError>> {
        self.setup_error.clone()
    }
}

/// Audit port that remembers every call in order.
#[derive(Debug, Default)]
pub struct RecordingAudit {
    calls: Mutex<Vec<(ImageReference, ImageReference)>>,
}

impl RecordingAudit {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded `(original, resolved)` pairs.
    #[must_use]
    pub fn calls(&self) -> Vec<(ImageReference, ImageReference)> {
        self.calls.lock().clone()
    }

    /// Returns the number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }
}

impl ImageAudit for RecordingAudit {
    fn collect(&self, original: &ImageReference, resolved: &ImageReference) {
        self.calls.lock().push((original.clone(), resolved.clone()));
    }
}
