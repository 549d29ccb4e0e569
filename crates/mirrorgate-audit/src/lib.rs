//! Audit collection for mirrorgate image resolutions.
//!
//! This crate provides the audit side of image resolution:
//! - The [`ImageAudit`] port the resolver hands each `(original, resolved)` pair to
//! - An [`ImageCollector`] that records pairs and verifies them after a run
//! - Structured audit events (substitution, verification)
//! - An [`AuditLogger`] with pluggable backends
//!
//! # Example
//!
//! ```rust
//! use mirrorgate_audit::{AuditLogger, ImageAudit, ImageCollector, InMemoryBackend};
//! use mirrorgate_core::ImageReference;
//! use std::sync::Arc;
//!
//! let backend = Arc::new(InMemoryBackend::new());
//! let logger = AuditLogger::builder().with_backend(backend.clone()).build();
//! let collector = ImageCollector::new().with_logger(logger);
//!
//! let original: ImageReference = "postgres:16".parse().unwrap();
//! let resolved: ImageReference = "mirror.example.com/std/postgres:16".parse().unwrap();
//! collector.collect(&original, &resolved);
//!
//! assert_eq!(collector.len(), 1);
//! assert_eq!(backend.events().len(), 1);
//!
//! let report = collector.verify(&["postgres:16"]);
//! assert!(report.is_clean());
//! ```

mod collector;
mod event;
mod logger;

pub use collector::{parse_allow_list, ImageAudit, ImageCollector, NoopAudit, VerificationReport};
pub use event::{
    AuditEvent, EventOutcome, EventSeverity, ImageSubstitutionEvent, VerificationEvent,
};
pub use logger::{
    AuditLogger, AuditLoggerBuilder, AuditRecord, InMemoryBackend, LoggerBackend, LoggerError,
    TracingBackend,
};
