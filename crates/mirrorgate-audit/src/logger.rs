//! Fan-out of audit events to pluggable sinks.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::event::{AuditEvent, EventSeverity};

/// An event serialized once and handed to every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// Event type identifier, e.g. `image.swapped`.
    pub event_type: &'static str,
    /// Severity the event was emitted with.
    pub severity: EventSeverity,
    /// JSON form of the event.
    pub json: String,
}

impl AuditRecord {
    /// Serializes `event` into a record.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Serialization`] if the event cannot be encoded.
    pub fn from_event<E: AuditEvent>(event: &E) -> Result<Self, LoggerError> {
        Ok(Self {
            event_type: event.event_type(),
            severity: event.severity(),
            json: serde_json::to_string(event)?,
        })
    }
}

/// Destination for audit records.
pub trait LoggerBackend: Send + Sync + Debug {
    /// Stores one record.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Backend`] if the sink rejects the record.
    fn record(&self, record: &AuditRecord) -> Result<(), LoggerError>;

    /// Short identifier used in diagnostics.
    fn name(&self) -> &'static str;
}

/// Audit logging failures.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// The event could not be encoded as JSON.
    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backend refused the record.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Sends audit events to every configured backend.
///
/// A backend that fails is reported through `tracing` and skipped; the
/// remaining backends still receive the record.
#[derive(Debug)]
pub struct AuditLogger {
    sinks: Vec<Arc<dyn LoggerBackend>>,
    /// `None` disables the logger.
    threshold: Option<EventSeverity>,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AuditLogger {
    /// Starts building a logger.
    #[must_use]
    pub fn builder() -> AuditLoggerBuilder {
        AuditLoggerBuilder::default()
    }

    /// Serializes `event` and hands it to each backend.
    ///
    /// Returns how many backends accepted the record; zero when the logger
    /// is disabled or the event is below the threshold.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Serialization`] if the event cannot be encoded.
    pub fn log<E: AuditEvent>(&self, event: &E) -> Result<usize, LoggerError> {
        let Some(threshold) = self.threshold else {
            return Ok(0);
        };
        if event.severity() < threshold {
            debug!(
                event_type = event.event_type(),
                severity = ?event.severity(),
                "Audit event below threshold"
            );
            return Ok(0);
        }

        let record = AuditRecord::from_event(event)?;
        let accepted = self
            .sinks
            .iter()
            .filter(|sink| match sink.record(&record) {
                Ok(()) => true,
                Err(e) => {
                    error!(
                        backend = sink.name(),
                        event_type = record.event_type,
                        "Audit backend rejected event: {e}"
                    );
                    false
                }
            })
            .count();
        Ok(accepted)
    }

    /// Number of configured backends.
    #[must_use]
    pub fn backend_count(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true unless the logger was built disabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.threshold.is_some()
    }
}

/// Configures an [`AuditLogger`].
#[derive(Debug)]
pub struct AuditLoggerBuilder {
    sinks: Vec<Arc<dyn LoggerBackend>>,
    enabled: bool,
    min_severity: EventSeverity,
}

impl Default for AuditLoggerBuilder {
    fn default() -> Self {
        Self {
            sinks: Vec::new(),
            enabled: true,
            min_severity: EventSeverity::Info,
        }
    }
}

impl AuditLoggerBuilder {
    /// Adds a backend.
    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn LoggerBackend>) -> Self {
        self.sinks.push(backend);
        self
    }

    /// Turns the logger on or off.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Drops events below `severity`.
    #[must_use]
    pub const fn min_severity(mut self, severity: EventSeverity) -> Self {
        self.min_severity = severity;
        self
    }

    /// Finishes the logger.
    #[must_use]
    pub fn build(self) -> AuditLogger {
        AuditLogger {
            sinks: self.sinks,
            threshold: self.enabled.then_some(self.min_severity),
        }
    }
}

/// Writes records to the `mirrorgate::audit` tracing target at a level
/// matching their severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingBackend;

impl TracingBackend {
    /// Creates the backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LoggerBackend for TracingBackend {
    fn record(&self, record: &AuditRecord) -> Result<(), LoggerError> {
        let event_type = record.event_type;
        let json = record.json.as_str();
        match record.severity {
            EventSeverity::Info => info!(target: "mirrorgate::audit", event_type, event = json),
            EventSeverity::Warning => warn!(target: "mirrorgate::audit", event_type, event = json),
            EventSeverity::Error => error!(target: "mirrorgate::audit", event_type, event = json),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

/// Keeps records in memory so tests and the CLI can inspect them afterwards.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    records: Mutex<Vec<AuditRecord>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON of every stored event, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.json.clone()).collect()
    }

    /// Every stored record, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    /// Drops everything stored so far.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LoggerBackend for InMemoryBackend {
    fn record(&self, record: &AuditRecord) -> Result<(), LoggerError> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}
