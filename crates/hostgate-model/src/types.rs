//! Topology types: hosts, applications, service clusters, and instances.
//!
//! These are immutable snapshots produced by the topology loader and the
//! service monitor. The orchestrator never mutates them.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Identifiers ───────────────────────────────────────────────────

/// Hostname of a machine running service instances.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostName(String);

impl HostName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HostName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for HostName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a service cluster within an application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(String);

impl ClusterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClusterId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Tenant-scoped application identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId {
    pub tenant: String,
    pub application: String,
}

impl ApplicationId {
    pub fn new(tenant: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            application: application.into(),
        }
    }

    /// Key prefix used when persisting per-application records.
    pub fn serialized_form(&self) -> String {
        format!("{}:{}", self.tenant, self.application)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tenant, self.application)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid application id '{0}', expected tenant:application")]
pub struct InvalidApplicationId(pub String);

impl FromStr for ApplicationId {
    type Err = InvalidApplicationId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((tenant, application))
                if !tenant.is_empty() && !application.is_empty() && !application.contains(':') =>
            {
                Ok(Self::new(tenant, application))
            }
            _ => Err(InvalidApplicationId(s.to_string())),
        }
    }
}

// ── Service kinds ─────────────────────────────────────────────────

/// The fixed set of service types the orchestrator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    ConfigServer,
    Controller,
    ClusterController,
    Slobrok,
    Storage,
    Distributor,
    Searchnode,
    Container,
    Proxy,
    MetricsProxy,
}

impl ServiceKind {
    /// Service type string as reported by the service monitor.
    pub fn service_type(&self) -> &'static str {
        match self {
            Self::ConfigServer => "configserver",
            Self::Controller => "controller",
            Self::ClusterController => "container-clustercontroller",
            Self::Slobrok => "slobrok",
            Self::Storage => "storagenode",
            Self::Distributor => "distributor",
            Self::Searchnode => "searchnode",
            Self::Container => "container",
            Self::Proxy => "proxy",
            Self::MetricsProxy => "metricsproxy-container",
        }
    }

    /// Human-readable name of the service, singular or plural.
    pub fn noun(&self, plural: bool) -> &'static str {
        match (self, plural) {
            (Self::ConfigServer, false) => "config server",
            (Self::ConfigServer, true) => "config servers",
            (Self::Controller, false) => "controller",
            (Self::Controller, true) => "controllers",
            (Self::ClusterController, false) => "cluster controller",
            (Self::ClusterController, true) => "cluster controllers",
            (Self::Storage, false) => "storage node",
            (Self::Storage, true) => "storage nodes",
            (Self::Distributor, false) => "distributor",
            (Self::Distributor, true) => "distributors",
            (Self::Searchnode, false) => "search node",
            (Self::Searchnode, true) => "search nodes",
            (Self::Proxy, false) => "proxy",
            (Self::Proxy, true) => "proxies",
            (_, false) => "service",
            (_, true) => "services",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_type())
    }
}

// ── Instances ─────────────────────────────────────────────────────

/// Live status of a service instance as seen by the service monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Up,
    Down,
    #[default]
    NotChecked,
    Unknown,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::NotChecked => "not_checked",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A single service running on a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Config id of the instance, e.g. `music/storage/0`.
    pub config_id: String,
    pub host: HostName,
    #[serde(default)]
    pub status: ServiceStatus,
    /// Unix timestamp (seconds) since which the instance has had its status.
    #[serde(default)]
    pub down_since: Option<u64>,
}

impl ServiceInstance {
    pub fn new(config_id: impl Into<String>, host: impl Into<HostName>, status: ServiceStatus) -> Self {
        Self {
            config_id: config_id.into(),
            host: host.into(),
            status,
            down_since: None,
        }
    }

    /// Set the time the instance was first seen in its current status.
    pub fn since(mut self, epoch_secs: u64) -> Self {
        self.down_since = Some(epoch_secs);
        self
    }

    /// Short name used in operator messages.
    pub fn descriptive_name(&self) -> String {
        format!("{} on {}", self.config_id, self.host)
    }
}

// ── Clusters ──────────────────────────────────────────────────────

/// A typed collection of service instances belonging to one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCluster {
    pub id: ClusterId,
    pub kind: ServiceKind,
    /// Expected number of instances. Unobserved instances count as missing.
    #[serde(default)]
    pub declared_size: Option<usize>,
    /// Hosts the cluster is expected to run on, when known.
    #[serde(default)]
    pub expected_hosts: Vec<HostName>,
    #[serde(default)]
    pub instances: Vec<ServiceInstance>,
}

impl ServiceCluster {
    pub fn new(id: impl Into<String>, kind: ServiceKind, instances: Vec<ServiceInstance>) -> Self {
        Self {
            id: ClusterId::new(id),
            kind,
            declared_size: None,
            expected_hosts: Vec::new(),
            instances,
        }
    }

    pub fn with_declared_size(mut self, size: usize) -> Self {
        self.declared_size = Some(size);
        self
    }

    pub fn with_expected_hosts<I, H>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<HostName>,
    {
        self.expected_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Declared size, or the number of expected hosts when only those are given.
    pub fn expected_size(&self) -> Option<usize> {
        self.declared_size.or_else(|| {
            (!self.expected_hosts.is_empty()).then_some(self.expected_hosts.len())
        })
    }

    /// Number of expected instances the service monitor did not report.
    pub fn missing_services(&self) -> usize {
        self.expected_size()
            .map(|size| size.saturating_sub(self.instances.len()))
            .unwrap_or(0)
    }

    /// Expected hosts that have no observed instance.
    pub fn missing_hosts(&self) -> Vec<&HostName> {
        let observed: BTreeSet<&HostName> = self.instances.iter().map(|i| &i.host).collect();
        self.expected_hosts
            .iter()
            .filter(|h| !observed.contains(h))
            .collect()
    }

    /// Total number of instances, observed or missing.
    pub fn size(&self) -> usize {
        self.instances.len() + self.missing_services()
    }

    pub fn is_storage(&self) -> bool {
        self.kind == ServiceKind::Storage
    }
}

// ── Applications ──────────────────────────────────────────────────

/// An application and its full service topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationInstance {
    pub id: ApplicationId,
    #[serde(default)]
    pub clusters: Vec<ServiceCluster>,
}

impl ApplicationInstance {
    pub fn new(id: ApplicationId, clusters: Vec<ServiceCluster>) -> Self {
        Self { id, clusters }
    }

    /// Every host running at least one instance, sorted.
    pub fn hosts(&self) -> BTreeSet<&HostName> {
        self.clusters
            .iter()
            .flat_map(|c| c.instances.iter().map(|i| &i.host))
            .collect()
    }

    pub fn has_host(&self, host: &HostName) -> bool {
        self.clusters
            .iter()
            .any(|c| c.instances.iter().any(|i| &i.host == host))
    }
}
