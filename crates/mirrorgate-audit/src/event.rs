//! Audit event definitions.

use chrono::{DateTime, Utc};
use mirrorgate_core::ImageReference;
use serde::{Deserialize, Serialize};
use uuid::{Timestamp, Uuid};

/// Generates a new v7 UUID for audit events.
fn new_event_id() -> Uuid {
    let ts = Timestamp::now(uuid::NoContext);
    Uuid::new_v7(ts)
}

/// Severity level for audit events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    /// Informational event
    #[default]
    Info,
    /// Warning event
    Warning,
    /// Error event
    Error,
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    /// Operation succeeded
    Success,
    /// Operation failed
    Failure,
}

/// Base trait for all audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type identifier.
    fn event_type(&self) -> &'static str;

    /// Returns the event severity.
    fn severity(&self) -> EventSeverity;

    /// Returns the event timestamp.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Returns the correlation ID for run tracing.
    fn correlation_id(&self) -> Option<&str>;
}

/// An image name handed to the collector after resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSubstitutionEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Requested image
    pub original: String,

    /// Image actually pulled
    pub resolved: String,

    /// Whether the name was rewritten
    pub swapped: bool,

    /// Event outcome
    pub outcome: EventOutcome,

    /// Correlation ID for tracing
    pub correlation_id: Option<String>,
}

impl ImageSubstitutionEvent {
    /// Creates an event for a resolved image.
    #[must_use]
    pub fn new(original: &ImageReference, resolved: &ImageReference) -> Self {
        Self {
            id: new_event_id(),
            timestamp: Utc::now(),
            original: original.canonical_name(),
            resolved: resolved.canonical_name(),
            swapped: original != resolved,
            outcome: EventOutcome::Success,
            correlation_id: None,
        }
    }

    /// Sets the correlation ID.
    #[must_use]
    pub fn with_correlation_id(mut self, id: &str) -> Self {
        self.correlation_id = Some(id.to_string());
        self
    }
}

impl AuditEvent for ImageSubstitutionEvent {
    fn event_type(&self) -> &'static str {
        if self.swapped {
            "image.swapped"
        } else {
            "image.kept"
        }
    }

    fn severity(&self) -> EventSeverity {
        EventSeverity::Info
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

/// Result of checking collected images against the allowed list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: DateTime<Utc>,

    /// Number of distinct images collected
    pub collected: usize,

    /// Collected images missing from the allowed list
    pub unexpected: Vec<String>,

    /// Event outcome
    pub outcome: EventOutcome,

    /// Correlation ID for tracing
    pub correlation_id: Option<String>,
}

impl VerificationEvent {
    /// Creates a verification event.
    #[must_use]
    pub fn new(collected: usize, unexpected: Vec<String>) -> Self {
        let outcome = if unexpected.is_empty() {
            EventOutcome::Success
        } else {
            EventOutcome::Failure
        };

        Self {
            id: new_event_id(),
            timestamp: Utc::now(),
            collected,
            unexpected,
            outcome,
            correlation_id: None,
        }
    }
}

impl AuditEvent for VerificationEvent {
    fn event_type(&self) -> &'static str {
        "image.verified"
    }

    fn severity(&self) -> EventSeverity {
        match self.outcome {
            EventOutcome::Success => EventSeverity::Info,
            EventOutcome::Failure => EventSeverity::Warning,
        }
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}
