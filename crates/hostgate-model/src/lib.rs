//! hostgate-model — data model shared by every hostgate crate.
//!
//! Describes the application topology the orchestrator reasons about:
//! applications own service clusters, clusters own service instances,
//! and every instance lives on a host. Persisted per-host maintenance
//! flags are modelled by [`HostStatus`] and read into an immutable
//! [`HostStatusSnapshot`] before each decision.
//!
//! All types are serde-serializable (snake_case) so topologies can be
//! loaded from files and statuses stored as JSON.

pub mod host_status;
pub mod types;

pub use host_status::{HostStatus, HostStatusSnapshot};
pub use types::*;
