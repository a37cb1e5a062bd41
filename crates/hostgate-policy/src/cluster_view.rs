//! One service cluster evaluated against a node group.

use hostgate_model::{
    ApplicationId, ClusterId, HostName, HostStatus, ServiceCluster, ServiceInstance,
    ServiceKind, ServiceStatus,
};
use tracing::warn;

use crate::down::DownClassifier;
use crate::error::UnknownServiceStatus;
use crate::node_group::NodeGroup;
use crate::reasons::SuspensionReasons;

/// Suspended hosts listed in a down description before summarizing.
const SUSPENDED_HOST_LIMIT: usize = 3;
/// Down services listed in a down description before summarizing.
const DOWN_SERVICE_LIMIT: usize = 2;

/// The storage instance of a storage cluster that sits inside a node group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageNode<'a> {
    pub cluster_id: &'a ClusterId,
    pub instance: &'a ServiceInstance,
}

impl<'a> StorageNode<'a> {
    pub fn host(&self) -> &'a HostName {
        &self.instance.host
    }

    pub fn config_id(&self) -> &'a str {
        &self.instance.config_id
    }
}

/// Availability of one cluster, with its instances split by group membership.
#[derive(Debug, Clone)]
pub struct ClusterView<'a> {
    application: &'a ApplicationId,
    cluster: &'a ServiceCluster,
    node_group: &'a NodeGroup<'a>,
    classifier: DownClassifier<'a>,
    services_in_group: Vec<&'a ServiceInstance>,
    services_outside_group: Vec<&'a ServiceInstance>,
}

impl<'a> ClusterView<'a> {
    pub fn new(
        cluster: &'a ServiceCluster,
        node_group: &'a NodeGroup<'a>,
        classifier: DownClassifier<'a>,
    ) -> Self {
        let (services_in_group, services_outside_group): (Vec<_>, Vec<_>) = cluster
            .instances
            .iter()
            .partition(|i| node_group.contains(&i.host));
        Self {
            application: node_group.application_id(),
            cluster,
            node_group,
            classifier,
            services_in_group,
            services_outside_group,
        }
    }

    pub fn application_id(&self) -> &'a ApplicationId {
        self.application
    }

    pub fn node_group(&self) -> &'a NodeGroup<'a> {
        self.node_group
    }

    pub fn cluster_id(&self) -> &'a ClusterId {
        &self.cluster.id
    }

    pub fn kind(&self) -> ServiceKind {
        self.cluster.kind
    }

    pub fn services_in_group(&self) -> &[&'a ServiceInstance] {
        &self.services_in_group
    }

    /// Instances outside the group that are effectively down.
    pub fn services_down_outside_group(&self) -> Vec<&'a ServiceInstance> {
        self.services_outside_group
            .iter()
            .copied()
            .filter(|i| self.classifier.is_down(i))
            .collect()
    }

    pub fn missing_services(&self) -> usize {
        self.cluster.missing_services()
    }

    /// Observed plus missing instances.
    pub fn size(&self) -> usize {
        self.cluster.size()
    }

    pub fn is_storage_cluster(&self) -> bool {
        self.cluster.is_storage()
    }

    /// Down-or-missing share of the cluster, ignoring the group.
    pub fn percentage_of_services_down_outside_group(&self) -> u32 {
        let down = self.services_down_outside_group().len() + self.missing_services();
        percentage(down, self.size())
    }

    /// Down-or-missing share of the cluster if every group instance also went down.
    pub fn percentage_of_services_down_if_group_is_allowed_to_be_down(&self) -> u32 {
        let down = self.services_down_outside_group().len()
            + self.missing_services()
            + self.services_in_group.len();
        percentage(down, self.size())
    }

    /// True if every instance outside the group is up and none are missing.
    ///
    /// Fails if an instance outside the group has unknown status. Unknown
    /// instances inside the group are ignored; they are about to go down.
    /// So are instances on suspended hosts, which count as down regardless
    /// of their reported status.
    pub fn no_services_outside_group_is_down(&self) -> Result<bool, UnknownServiceStatus> {
        if let Some(unknown) = self.services_outside_group.iter().find(|i| {
            i.status == ServiceStatus::Unknown && !self.classifier.host_status(&i.host).is_suspended()
        }) {
            return Err(UnknownServiceStatus {
                cluster: self.cluster_info(),
                instance: unknown.descriptive_name(),
            });
        }
        Ok(self.services_down_outside_group().is_empty() && self.missing_services() == 0)
    }

    /// Reasons why every group instance is already down, or `None` if one is up.
    pub fn all_services_down(&self) -> Option<SuspensionReasons> {
        let mut reasons = SuspensionReasons::new();
        for instance in &self.services_in_group {
            reasons.merge(self.classifier.effectively_down(instance)?);
        }
        Some(reasons)
    }

    /// The storage instance inside the group, if this is a storage cluster.
    ///
    /// At most one is expected per cluster; with more, the first by host wins.
    pub fn storage_node_in_group(&self) -> Option<StorageNode<'a>> {
        if !self.is_storage_cluster() {
            return None;
        }
        if self.services_in_group.len() > 1 {
            warn!(
                cluster = %self.cluster.id,
                hosts = %self.node_group,
                count = self.services_in_group.len(),
                "node group holds several storage nodes of one cluster"
            );
        }
        let first = self.services_in_group.iter().copied().min_by(|a, b| a.host.cmp(&b.host))?;
        Some(StorageNode {
            cluster_id: &self.cluster.id,
            instance: first,
        })
    }

    pub fn cluster_info(&self) -> String {
        format!(
            "cluster '{}' of type '{}'",
            self.cluster.id,
            self.cluster.kind.service_type()
        )
    }

    /// Noun phrase for the cluster's services, e.g. "storage nodes in cluster 'music'".
    pub fn service_description(&self, plural: bool) -> String {
        format!("{} in cluster '{}'", self.cluster.kind.noun(plural), self.cluster.id)
    }

    /// What is already down outside the group, as sentence fragments each
    /// starting with a space.
    pub fn down_description(&self) -> String {
        let mut description = String::new();
        let down = self.services_down_outside_group();

        let mut suspended: Vec<&HostName> = down
            .iter()
            .map(|i| &i.host)
            .filter(|h| self.classifier.host_status(h) == HostStatus::AllowedToBeDown)
            .collect();
        suspended.sort();
        suspended.dedup();
        if !suspended.is_empty() {
            description.push_str(" Suspended hosts: ");
            description.push_str(&limited_list(
                suspended.iter().map(|h| h.to_string()),
                SUSPENDED_HOST_LIMIT,
            ));
            description.push('.');
        }

        let down_elsewhere: Vec<&ServiceInstance> = down
            .into_iter()
            .filter(|i| !self.classifier.host_status(&i.host).is_suspended())
            .collect();
        if !down_elsewhere.is_empty() {
            description.push_str(" Services down on resumed hosts: ");
            description.push_str(&limited_list(
                down_elsewhere.iter().map(|i| i.descriptive_name()),
                DOWN_SERVICE_LIMIT,
            ));
            description.push('.');
        }

        let missing = self.missing_services();
        if missing > 0 {
            let noun = self.cluster.kind.noun(missing > 1);
            description.push_str(&format!(" {missing} missing {noun}"));
            let hosts = self.cluster.missing_hosts();
            if !hosts.is_empty() {
                let names: Vec<&str> = hosts.iter().map(|h| h.as_str()).collect();
                description.push_str(": ");
                description.push_str(&names.join(", "));
            }
            description.push('.');
        }

        description
    }
}

/// `100 * part / whole`, rounded to the nearest integer, halves up.
fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part * 200 + whole) / (2 * whole)) as u32
}

fn limited_list(items: impl ExactSizeIterator<Item = String>, limit: usize) -> String {
    let total = items.len();
    let mut shown: Vec<String> = items.take(limit).collect();
    if total > limit {
        shown.push(format!("and {} more", total - limit));
    }
    shown.join(", ")
}
