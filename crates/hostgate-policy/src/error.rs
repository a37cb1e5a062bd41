//! Denials and evaluation failures.

use std::fmt;

use thiserror::Error;

use crate::node_group::NodeGroup;

/// Availability constraint a refused state change would have violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// Too many services of a cluster would be down.
    EnoughServicesUp,
    /// A service outside the group has unknown status, so safety cannot be shown.
    UnknownServiceStatus,
    /// The cluster controller refused a storage node state change.
    ClusterControllerAvailable,
}

impl Constraint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnoughServicesUp => "enough-services-up",
            Self::UnknownServiceStatus => "unknown-service-status",
            Self::ClusterControllerAvailable => "cluster-controller-available",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A refused suspension or resume, with the constraint and an operator message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Changing the state of {hosts} would violate {constraint}: {message}")]
pub struct HostStateChangeDenied {
    /// Comma-separated hosts of the node group.
    pub hosts: String,
    pub constraint: Constraint,
    pub message: String,
}

impl HostStateChangeDenied {
    pub fn new(node_group: &NodeGroup<'_>, constraint: Constraint, message: impl Into<String>) -> Self {
        Self {
            hosts: node_group.hosts_string(),
            constraint,
            message: message.into(),
        }
    }
}

/// A service instance outside the node group has unknown status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("status of {instance} in {cluster} is unknown")]
pub struct UnknownServiceStatus {
    pub cluster: String,
    pub instance: String,
}
