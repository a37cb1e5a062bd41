//! hostgate-policy — decides whether a group of hosts may be suspended.
//!
//! Given an application's topology, the live status of its service
//! instances and the persisted host statuses, the policy answers one
//! question: can the hosts of a [`NodeGroup`] be allowed to go down right
//! now without taking any service cluster below its availability limit?
//!
//! # Architecture
//!
//! ```text
//! ClusterPolicy::grant_suspension_request(&ApplicationView)
//!   └── ApplicationView::clusters()      clusters touching the group, in ClusterOrder
//!       └── ClusterView                  one cluster scoped to the group
//!           ├── DownClassifier           host status + down moratorium
//!           ├── percentage_of_services_down_*()
//!           └── all_services_down() → SuspensionReasons
//! ```
//!
//! Everything here is pure computation over borrowed snapshots. The caller
//! owns locking, reading host status and writing the result.
//!
//! # Down moratorium
//!
//! A freshly failed instance is not counted as down until it has been down
//! for [`DEFAULT_DOWN_MORATORIUM`], so a flapping service neither blocks
//! maintenance elsewhere nor lets it through on a transient blip.

pub mod application_view;
pub mod clock;
pub mod cluster_view;
pub mod down;
pub mod error;
pub mod node_group;
pub mod policy;
pub mod reasons;

pub use application_view::{by_cluster_id, ApplicationView, ClusterOrder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use cluster_view::{ClusterView, StorageNode};
pub use down::{DownClassifier, DEFAULT_DOWN_MORATORIUM};
pub use error::{Constraint, HostStateChangeDenied, UnknownServiceStatus};
pub use node_group::NodeGroup;
pub use policy::{ClusterPolicy, SuspensionLimit};
pub use reasons::SuspensionReasons;
