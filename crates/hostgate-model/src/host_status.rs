//! Persisted per-host maintenance status.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::HostName;

/// Orchestrator flag stored for each host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostStatus {
    /// Normal operation.
    #[default]
    NoRemarks,
    /// The host has been granted permission to be taken down.
    AllowedToBeDown,
}

impl HostStatus {
    pub fn is_suspended(&self) -> bool {
        *self == Self::AllowedToBeDown
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoRemarks => "no_remarks",
            Self::AllowedToBeDown => "allowed_to_be_down",
        }
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host statuses of one application, read just before an evaluation.
///
/// Hosts without an entry are `NoRemarks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatusSnapshot {
    statuses: BTreeMap<HostName, HostStatus>,
}

impl HostStatusSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_of(&self, host: &HostName) -> HostStatus {
        self.statuses.get(host).copied().unwrap_or_default()
    }

    pub fn set(&mut self, host: HostName, status: HostStatus) {
        if status == HostStatus::NoRemarks {
            self.statuses.remove(&host);
        } else {
            self.statuses.insert(host, status);
        }
    }

    /// Builder-style `set`.
    pub fn with(mut self, host: impl Into<HostName>, status: HostStatus) -> Self {
        self.set(host.into(), status);
        self
    }

    /// Hosts with a non-default status, sorted.
    pub fn iter(&self) -> impl Iterator<Item = (&HostName, HostStatus)> {
        self.statuses.iter().map(|(h, s)| (h, *s))
    }

    pub fn suspended_hosts(&self) -> impl Iterator<Item = &HostName> {
        self.iter().filter(|(_, s)| s.is_suspended()).map(|(h, _)| h)
    }
}

impl FromIterator<(HostName, HostStatus)> for HostStatusSnapshot {
    fn from_iter<I: IntoIterator<Item = (HostName, HostStatus)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (host, status) in iter {
            snapshot.set(host, status);
        }
        snapshot
    }
}
