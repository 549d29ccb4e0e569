//! # Mirrorgate Core
//!
//! Core value types for resolving container image references against an
//! internal mirror registry.
//!
//! This crate provides the foundational data structures shared by the rest
//! of the workspace:
//!
//! - [`ImageReference`] - Parsed `[registry/]repository[:tag|@digest]` value
//! - [`MirrorSelection`] - Which mirror organization an image routes through
//! - [`ResolutionOutcome`] - Result of resolving one reference
//! - [`ResolutionRule`] - Identifier of the rule that produced an outcome
//!
//! ## Example
//!
//! ```rust
//! use mirrorgate_core::ImageReference;
//!
//! let image: ImageReference = "quay.io/org/app:1.2".parse().unwrap();
//! assert_eq!(image.registry(), Some("quay.io"));
//! assert_eq!(image.repository(), "org/app");
//! assert_eq!(image.tag(), Some("1.2"));
//!
//! let hub: ImageReference = "postgres".parse().unwrap();
//! assert_eq!(hub.registry(), None);
//! assert_eq!(hub.to_string(), "postgres:latest");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod outcome;
pub mod reference;
pub mod selection;


pub use error::{Error, Result};
pub use outcome::{ResolutionOutcome, ResolutionRule};
pub use reference::{ImageReference, ImageVersion, DEFAULT_TAG};
pub use selection::MirrorSelection;
