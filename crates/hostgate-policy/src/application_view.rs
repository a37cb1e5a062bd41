//! An application's clusters, scoped to one node group.

use std::cmp::Ordering;
use std::time::Duration;

use hostgate_model::{
    ApplicationId, ApplicationInstance, HostName, HostStatus, HostStatusSnapshot, ServiceCluster,
};

use crate::cluster_view::{ClusterView, StorageNode};
use crate::down::DownClassifier;
use crate::node_group::NodeGroup;

/// Total order over the clusters of an application.
///
/// Determines evaluation order and the order storage nodes are suspended
/// (ascending) and resumed (descending).
pub type ClusterOrder = fn(&ServiceCluster, &ServiceCluster) -> Ordering;

/// Lexicographic by cluster id, then by service type.
pub fn by_cluster_id(a: &ServiceCluster, b: &ServiceCluster) -> Ordering {
    a.id.cmp(&b.id)
        .then_with(|| a.kind.service_type().cmp(b.kind.service_type()))
}

/// Request-scoped view of an application for one node group.
#[derive(Debug, Clone)]
pub struct ApplicationView<'a> {
    application: &'a ApplicationInstance,
    node_group: &'a NodeGroup<'a>,
    classifier: DownClassifier<'a>,
    cluster_order: ClusterOrder,
}

impl<'a> ApplicationView<'a> {
    /// Build a view evaluated at `now` (unix seconds).
    pub fn new(
        node_group: &'a NodeGroup<'a>,
        host_statuses: &'a HostStatusSnapshot,
        now: u64,
        moratorium: Duration,
    ) -> Self {
        Self {
            application: node_group.application(),
            node_group,
            classifier: DownClassifier::new(host_statuses, now, moratorium),
            cluster_order: by_cluster_id,
        }
    }

    /// Replace the cluster ordering.
    pub fn with_cluster_order(mut self, order: ClusterOrder) -> Self {
        self.cluster_order = order;
        self
    }

    pub fn application_id(&self) -> &'a ApplicationId {
        &self.application.id
    }

    pub fn node_group(&self) -> &'a NodeGroup<'a> {
        self.node_group
    }

    /// Views of every cluster with an instance on a group host, in cluster order.
    pub fn clusters(&self) -> Vec<ClusterView<'a>> {
        let mut clusters: Vec<&'a ServiceCluster> = self
            .application
            .clusters
            .iter()
            .filter(|c| c.instances.iter().any(|i| self.node_group.contains(&i.host)))
            .collect();
        let order = self.cluster_order;
        clusters.sort_by(|a, b| order(a, b));
        clusters
            .into_iter()
            .map(|c| ClusterView::new(c, self.node_group, self.classifier))
            .collect()
    }

    /// Group hosts currently at `status`, in node-group order.
    pub fn nodes_in_group_with_status(&self, status: HostStatus) -> Vec<&'a HostName> {
        self.node_group
            .hosts()
            .iter()
            .filter(|h| self.classifier.host_status(h) == status)
            .collect()
    }

    /// In-group storage nodes on hosts with no remarks, in cluster order.
    pub fn up_storage_nodes_in_group_in_cluster_order(&self) -> Vec<StorageNode<'a>> {
        self.storage_nodes_in_group_with_status(HostStatus::NoRemarks)
    }

    /// In-group storage nodes on suspended hosts, in reverse cluster order.
    pub fn suspended_storage_nodes_in_group_in_reverse_cluster_order(&self) -> Vec<StorageNode<'a>> {
        let mut nodes = self.storage_nodes_in_group_with_status(HostStatus::AllowedToBeDown);
        nodes.reverse();
        nodes
    }

    fn storage_nodes_in_group_with_status(&self, status: HostStatus) -> Vec<StorageNode<'a>> {
        self.clusters()
            .iter()
            .filter_map(ClusterView::storage_node_in_group)
            .filter(|node| self.classifier.host_status(node.host()) == status)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::down::DEFAULT_DOWN_MORATORIUM;
    use hostgate_model::{ServiceInstance, ServiceKind, ServiceStatus};

    const NOW: u64 = 100_000;

    fn up(config_id: &str, host: &str) -> ServiceInstance {
        ServiceInstance::new(config_id, host, ServiceStatus::Up)
    }

    /// Storage clusters "b" (h1, h2) and "a" (h3, h4), plus a container
    /// cluster spanning all four hosts.
    fn application() -> ApplicationInstance {
        ApplicationInstance::new(
            ApplicationId::new("t", "a"),
            vec![
                ServiceCluster::new(
                    "container",
                    ServiceKind::Container,
                    vec![
                        up("c/0", "h1"),
                        up("c/1", "h2"),
                        up("c/2", "h3"),
                        up("c/3", "h4"),
                    ],
                ),
                ServiceCluster::new("b", ServiceKind::Storage, vec![up("b/0", "h1"), up("b/1", "h2")]),
                ServiceCluster::new("a", ServiceKind::Storage, vec![up("a/0", "h3"), up("a/1", "h4")]),
            ],
        )
    }

    fn hosts(nodes: &[StorageNode<'_>]) -> Vec<String> {
        nodes.iter().map(|n| n.host().to_string()).collect()
    }

    #[test]
    fn clusters_touching_group_in_cluster_order() {
        let app = application();
        let statuses = HostStatusSnapshot::new();
        let group = NodeGroup::new(&app, ["h1", "h4"]);
        let view = ApplicationView::new(&group, &statuses, NOW, DEFAULT_DOWN_MORATORIUM);

        let ids: Vec<&str> = view.clusters().iter().map(|c| c.cluster_id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "container"]);

        let group = NodeGroup::new(&app, ["h1"]);
        let view = ApplicationView::new(&group, &statuses, NOW, DEFAULT_DOWN_MORATORIUM);
        let ids: Vec<&str> = view.clusters().iter().map(|c| c.cluster_id().as_str()).collect();
        assert_eq!(ids, vec!["b", "container"]);
    }

    #[test]
    fn cluster_order_is_independent_of_input_order() {
        let app = application();
        let mut reversed = app.clone();
        reversed.clusters.reverse();
        let statuses = HostStatusSnapshot::new();

        let group = NodeGroup::new(&app, ["h1", "h3"]);
        let first: Vec<String> = ApplicationView::new(&group, &statuses, NOW, DEFAULT_DOWN_MORATORIUM)
            .clusters()
            .iter()
            .map(|c| c.cluster_id().to_string())
            .collect();

        let group = NodeGroup::new(&reversed, ["h3", "h1"]);
        let view = ApplicationView::new(&group, &statuses, NOW, DEFAULT_DOWN_MORATORIUM);
        let second: Vec<String> = view.clusters().iter().map(|c| c.cluster_id().to_string()).collect();
        let again: Vec<String> = view.clusters().iter().map(|c| c.cluster_id().to_string()).collect();

        assert_eq!(first, second);
        assert_eq!(second, again);
    }

    #[test]
    fn custom_cluster_order() {
        fn descending(a: &ServiceCluster, b: &ServiceCluster) -> Ordering {
            by_cluster_id(b, a)
        }
        let app = application();
        let statuses = HostStatusSnapshot::new();
        let group = NodeGroup::new(&app, ["h1", "h4"]);
        let view = ApplicationView::new(&group, &statuses, NOW, DEFAULT_DOWN_MORATORIUM)
            .with_cluster_order(descending);

        assert_eq!(hosts(&view.up_storage_nodes_in_group_in_cluster_order()), vec!["h1", "h4"]);
    }

    #[test]
    fn up_storage_nodes_in_cluster_order() {
        let app = application();
        let statuses = HostStatusSnapshot::new();
        let group = NodeGroup::new(&app, ["h1", "h4"]);
        let view = ApplicationView::new(&group, &statuses, NOW, DEFAULT_DOWN_MORATORIUM);

        assert_eq!(hosts(&view.up_storage_nodes_in_group_in_cluster_order()), vec!["h4", "h1"]);
        assert!(view
            .suspended_storage_nodes_in_group_in_reverse_cluster_order()
            .is_empty());
    }

    #[test]
    fn suspended_storage_nodes_in_reverse_cluster_order() {
        let app = application();
        let statuses = HostStatusSnapshot::new()
            .with("h1", HostStatus::AllowedToBeDown)
            .with("h4", HostStatus::AllowedToBeDown);
        let group = NodeGroup::new(&app, ["h1", "h4"]);
        let view = ApplicationView::new(&group, &statuses, NOW, DEFAULT_DOWN_MORATORIUM);

        assert_eq!(
            hosts(&view.suspended_storage_nodes_in_group_in_reverse_cluster_order()),
            vec!["h1", "h4"]
        );
        assert!(view.up_storage_nodes_in_group_in_cluster_order().is_empty());
    }

    #[test]
    fn nodes_in_group_with_status() {
        let app = application();
        let statuses = HostStatusSnapshot::new()
            .with("h2", HostStatus::AllowedToBeDown)
            .with("h3", HostStatus::AllowedToBeDown);
        let group = NodeGroup::new(&app, ["h3", "h1", "h2"]);
        let view = ApplicationView::new(&group, &statuses, NOW, DEFAULT_DOWN_MORATORIUM);

        let suspended: Vec<&str> = view
            .nodes_in_group_with_status(HostStatus::AllowedToBeDown)
            .into_iter()
            .map(HostName::as_str)
            .collect();
        assert_eq!(suspended, vec!["h2", "h3"]);

        let normal = view.nodes_in_group_with_status(HostStatus::NoRemarks);
        assert_eq!(normal, vec![&HostName::from("h1")]);
        assert_eq!(view.application_id().to_string(), "t:a");
    }
}
