//! hostgate-status — persisted host status and application locks.
//!
//! Backed by [redb](https://docs.rs/redb). Each host's orchestrator flag
//! (`no_remarks` / `allowed_to_be_down`) is stored as a JSON record under
//! the composite key `{tenant}:{application}/{host}`, so all hosts of one
//! application can be read with a prefix scan.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!   ├── ApplicationLocks::lock(app)    exclusive, per application, with timeout
//!   ├── HostStatusStore::snapshot(app) read before evaluation
//!   └── HostStatusStore::set_host_statuses(app, ..)  one write txn on grant
//! ```
//!
//! The store is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`).

pub mod error;
pub mod lock;
pub mod store;
pub mod tables;

pub use error::{StatusError, StatusResult};
pub use lock::{ApplicationLock, ApplicationLocks};
pub use store::{HostStatusRecord, HostStatusStore};
