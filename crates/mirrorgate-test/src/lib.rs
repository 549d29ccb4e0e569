//! # Mirrorgate Test
//!
//! Test tooling for the Mirrorgate resolver.
//!
//! This crate provides:
//!
//! - [`StaticAvailability`], a gate with a fixed answer
//! - [`RecordingAudit`], an audit port that records every call
//! - YAML resolution fixtures ([`FixtureSet`], [`ResolutionFixture`])
//! - Assertion helpers
//!
//! ## Example
//!
//! ```rust
//! use mirrorgate_test::{image, load_fixture_set, RecordingAudit};
//!
//! let scenarios = load_fixture_set("scenarios.yaml").unwrap();
//! assert!(!scenarios.is_empty());
//!
//! let audit = RecordingAudit::new();
//! assert!(audit.is_empty());
//! assert_eq!(image("redis").to_string(), "redis:latest");
//! ```

pub mod error;
pub mod fakes;
pub mod fixtures;
pub mod test_utils;

pub use error::{FixtureError, Result};
pub use fakes::{RecordingAudit, StaticAvailability};
pub use fixtures::{
    fixtures_dir, load_fixture_set, ExpectedError, FixtureExpectation, FixtureSet,
    ResolutionFixture,
};
pub use test_utils::{assert_mirrored, assert_unchanged, image, MIRROR_HOST};
