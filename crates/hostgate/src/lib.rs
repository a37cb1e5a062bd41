//! hostgate — orchestrator facade over the availability policy.
//!
//! Wires the pure policy of `hostgate-policy` to its collaborators: the
//! host-status registry and application locks of `hostgate-status`, a
//! [`Clock`](hostgate_policy::Clock), and a cluster controller that is told
//! about storage node state changes.
//!
//! # Suspending a node group
//!
//! ```text
//! Orchestrator::suspend_group(group)
//!   ├── ApplicationLocks::lock(app)              serialize per application
//!   ├── HostStatusStore::snapshot(app)
//!   ├── ClusterPolicy::grant_suspension_request  deny → HostStateChangeDenied
//!   ├── ClusterController: maintenance           storage nodes, cluster order
//!   └── HostStatusStore::set_host_statuses       allowed_to_be_down
//! ```
//!
//! Resume runs the same sequence in reverse: storage nodes are set up in
//! reverse cluster order and hosts go back to `no_remarks`. Resume is never
//! refused by the availability policy.

pub mod cluster_controller;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod topology;

pub use cluster_controller::{
    ClusterControllerClient, ClusterControllerError, NodeState, RecordingClusterController,
    StorageNodeChange,
};
pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::Orchestrator;
pub use topology::Topology;
