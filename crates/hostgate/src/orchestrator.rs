//! Suspends and resumes node groups.
//!
//! Each state change runs under the application's lock: read host status,
//! evaluate, inform the cluster controller, write host status. Evaluation
//! itself never awaits.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use hostgate_model::{ApplicationId, HostName, HostStatus, HostStatusSnapshot};
use hostgate_policy::{
    ApplicationView, Clock, ClusterPolicy, Constraint, HostStateChangeDenied, NodeGroup,
    StorageNode, SuspensionReasons, SystemClock,
};
use hostgate_status::{ApplicationLocks, HostStatusStore};

use crate::cluster_controller::{ClusterControllerClient, NodeState, StorageNodeChange};
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::topology::Topology;

/// Grants and releases permission to take hosts down.
pub struct Orchestrator<C> {
    store: HostStatusStore,
    locks: ApplicationLocks,
    clock: Arc<dyn Clock>,
    controller: C,
    policy: ClusterPolicy,
    moratorium: Duration,
    lock_timeout: Duration,
}

impl<C: ClusterControllerClient> Orchestrator<C> {
    /// Create an orchestrator using wall-clock time and its own locks.
    pub fn new(store: HostStatusStore, controller: C, config: &OrchestratorConfig) -> Self {
        Self {
            store,
            locks: ApplicationLocks::new(),
            clock: Arc::new(SystemClock),
            controller,
            policy: config.cluster_policy(),
            moratorium: config.down_moratorium(),
            lock_timeout: config.lock_timeout(),
        }
    }

    /// Use a different time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share application locks with other orchestrators over the same store.
    pub fn with_locks(mut self, locks: ApplicationLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn store(&self) -> &HostStatusStore {
        &self.store
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn host_status(
        &self,
        application: &ApplicationId,
        host: &HostName,
    ) -> OrchestratorResult<HostStatus> {
        Ok(self.store.host_status(application, host)?)
    }

    /// Evaluate a suspension without taking the lock or changing anything.
    pub fn check_suspend(&self, group: &NodeGroup<'_>) -> OrchestratorResult<SuspensionReasons> {
        let snapshot = self.store.snapshot(group.application_id())?;
        let view = self.view(group, &snapshot);
        Ok(self.policy.grant_suspension_request(&view)?)
    }

    /// Suspend every host of the group, or refuse with the violated constraint.
    ///
    /// Storage nodes are put in maintenance cluster by cluster before any
    /// host status is written. If the cluster controller refuses one, the
    /// nodes it already accepted are set up again.
    pub async fn suspend_group(
        &self,
        group: &NodeGroup<'_>,
    ) -> OrchestratorResult<SuspensionReasons> {
        let application = group.application_id();
        let _lock = self.locks.lock(application, self.lock_timeout).await?;

        let snapshot = self.store.snapshot(application)?;
        let view = self.view(group, &snapshot);
        let reasons = self.policy.grant_suspension_request(&view)?;

        let mut accepted = Vec::new();
        for node in view.up_storage_nodes_in_group_in_cluster_order() {
            let change = StorageNodeChange::new(application, &node, NodeState::Maintenance);
            if let Err(e) = self.controller.set_node_state(change).await {
                let denied = HostStateChangeDenied::new(
                    group,
                    Constraint::ClusterControllerAvailable,
                    e.to_string(),
                );
                info!(%application, hosts = %group, error = %e, "suspension denied by cluster controller");
                self.undo_maintenance(application, accepted).await;
                return Err(denied.into());
            }
            accepted.push(node);
        }

        let hosts: Vec<HostName> = view
            .nodes_in_group_with_status(HostStatus::NoRemarks)
            .into_iter()
            .cloned()
            .collect();
        self.store
            .set_host_statuses(application, &hosts, HostStatus::AllowedToBeDown)?;

        if let Some(message) = reasons.log_message() {
            info!(%application, hosts = %group, "{message}");
        }
        info!(%application, hosts = %group, "node group suspended");
        Ok(reasons)
    }

    /// Resume every suspended host of the group.
    ///
    /// Storage nodes are brought up in reverse cluster order, undoing
    /// suspension in the opposite order it was applied.
    pub async fn resume_group(&self, group: &NodeGroup<'_>) -> OrchestratorResult<()> {
        let application = group.application_id();
        let _lock = self.locks.lock(application, self.lock_timeout).await?;

        let snapshot = self.store.snapshot(application)?;
        let view = self.view(group, &snapshot);

        for node in view.suspended_storage_nodes_in_group_in_reverse_cluster_order() {
            let change = StorageNodeChange::new(application, &node, NodeState::Up);
            self.controller.set_node_state(change).await?;
        }

        let hosts: Vec<HostName> = view
            .nodes_in_group_with_status(HostStatus::AllowedToBeDown)
            .into_iter()
            .cloned()
            .collect();
        if hosts.is_empty() {
            debug!(%application, hosts = %group, "nothing to resume");
            return Ok(());
        }
        self.store
            .set_host_statuses(application, &hosts, HostStatus::NoRemarks)?;
        info!(%application, hosts = %group, "node group resumed");
        Ok(())
    }

    /// Suspend a single host of whichever application runs on it.
    pub async fn suspend_host(
        &self,
        topology: &Topology,
        host: &HostName,
    ) -> OrchestratorResult<SuspensionReasons> {
        let application = topology
            .application_for_host(host)
            .ok_or_else(|| OrchestratorError::HostNotFound(host.clone()))?;
        let group = NodeGroup::new(application, [host.clone()]);
        self.suspend_group(&group).await
    }

    /// Resume a single host of whichever application runs on it.
    pub async fn resume_host(&self, topology: &Topology, host: &HostName) -> OrchestratorResult<()> {
        let application = topology
            .application_for_host(host)
            .ok_or_else(|| OrchestratorError::HostNotFound(host.clone()))?;
        let group = NodeGroup::new(application, [host.clone()]);
        self.resume_group(&group).await
    }

    /// Bring storage nodes back up after a suspension failed partway,
    /// in reverse of the order they went down.
    async fn undo_maintenance(&self, application: &ApplicationId, nodes: Vec<StorageNode<'_>>) {
        for node in nodes.iter().rev() {
            let change = StorageNodeChange::new(application, node, NodeState::Up);
            if let Err(e) = self.controller.set_node_state(change).await {
                warn!(
                    %application,
                    host = %node.host(),
                    error = %e,
                    "storage node left in maintenance after failed suspension"
                );
            }
        }
    }

    fn view<'a>(
        &self,
        group: &'a NodeGroup<'a>,
        snapshot: &'a HostStatusSnapshot,
    ) -> ApplicationView<'a> {
        ApplicationView::new(group, snapshot, self.clock.now_secs(), self.moratorium)
    }
}
