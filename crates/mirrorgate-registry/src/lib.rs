//! # Mirrorgate Registry
//!
//! Availability gate for the internal mirror registry.
//!
//! The gate answers one question for the resolver: can images be pulled
//! through the mirror right now? It runs a list of setup probes the first
//! time it is asked and memoizes the answer, together with the error that
//! made the mirror unusable.
//!
//! ## Features
//!
//! - **Memoized state**: probes run at most once per gate, even under
//!   concurrent first access
//! - **Docker config registration**: mirror credentials are written to the
//!   docker client config so the container runtime can pull
//! - **Reachability check**: `GET /v2/` against the mirror host
//! - **Forced unavailability**: a gate can be pinned unavailable with a
//!   diagnostic reason
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mirrorgate_registry::{
//!     AvailabilityGate, DockerConfigProbe, HttpProbe, MirrorAuth, MirrorAvailability, MirrorConfig,
//! };
//!
//! let config = MirrorConfig::new("mirror.example.com")
//!     .with_auth(MirrorAuth::basic("ci-user", "token"));
//!
//! let gate = AvailabilityGate::new(config)
//!     .with_probe(DockerConfigProbe::new("/home/ci/.docker/config.json"))
//!     .with_probe(HttpProbe::new());
//!
//! if gate.is_available() {
//!     println!("pulling through {}", gate.registry_host());
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    AvailabilityGate                         │
//! │  ┌─────────────┐  ┌──────────────────┐  ┌────────────────┐  │
//! │  │ MirrorConfig│  │ DockerConfigProbe│  │   HttpProbe    │  │
//! │  │  (env)      │  │  (config.json)   │  │   (GET /v2/)   │  │
//! │  └─────────────┘  └──────────────────┘  └────────────────┘  │
//! │                OnceCell<AvailabilityState>                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod config;
mod error;
mod gate;
mod probe;

pub use config::{
    MirrorAuth, MirrorConfig, TlsConfig, ENV_MIRROR_HOST, ENV_MIRROR_TOKEN, ENV_MIRROR_USER,
};
pub use error::ProbeError;
pub use gate::{AvailabilityGate, AvailabilityState, MirrorAvailability};
pub use probe::{DockerConfigProbe, HttpProbe, MirrorProbe};
