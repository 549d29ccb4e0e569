//! # Mirrorgate Resolver
//!
//! Decides which registry a container image is pulled from.
//!
//! Given a requested [`ImageReference`](mirrorgate_core::ImageReference),
//! the [`Resolver`] walks a fixed priority list of rules and returns either
//! the original reference or one routed through the internal mirror
//! registry, together with the reason.
//!
//! ## Rules
//!
//! | # | Rule | Result |
//! |---|------|--------|
//! | 1 | Synthetic (locally built or committed) image | keep, not audited |
//! | 2 | Repository only exists in the mirror | mirror host, same path |
//! | 3 | Explicit private-only registry | [`ResolveError::UnsupportedPrivateRegistry`] |
//! | 4 | Any other explicit registry | keep |
//! | 5 | Remote container host | mirror |
//! | 6 | Force external | keep |
//! | 7 | Mirror available | mirror |
//! | 8 | Mock mirror | mirror |
//! | 9 | Default | keep |
//!
//! A mirrored outcome is re-checked against the availability gate; if the
//! mirror is unusable (and not mocked) resolution fails with
//! [`ResolveError::MirrorRequiredButUnavailable`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mirrorgate_registry::{AvailabilityGate, MirrorConfig};
//! use mirrorgate_resolver::{HostMode, ResolveContext, Resolver};
//!
//! let gate = Arc::new(AvailabilityGate::new(MirrorConfig::new("mirror.example.com")));
//! let resolver = Resolver::new(gate);
//!
//! let outcome = resolver
//!     .resolve(&"foo/bar:1.0".parse().unwrap(), &ResolveContext::new(HostMode::Local))
//!     .unwrap();
//! assert!(outcome.used_mirror);
//! assert_eq!(
//!     outcome.resolved.to_string(),
//!     "mirror.example.com/wasliberty-docker-remote/foo/bar:1.0"
//! );
//! ```

#![deny(missing_docs)]
#![warn(clippy::pedantic)]

mod context;
mod error;
mod policy;
mod resolver;
mod rules;

pub use context::{HostMode, ResolveContext, ENV_DOCKER_HOST, ENV_FORCE_EXTERNAL, ENV_MOCK_MIRROR};
pub use error::{PolicyError, ResolveError};
pub use policy::MirrorPolicy;
pub use resolver::Resolver;
