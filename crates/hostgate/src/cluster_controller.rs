//! Boundary to the storage cluster controller.
//!
//! Storage clusters redistribute replicas when a node leaves. Before a
//! storage host is suspended the cluster controller is asked to put the
//! node in maintenance, and on resume to bring it back up. The orchestrator
//! only decides the order; the RPC lives behind [`ClusterControllerClient`].

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use hostgate_model::{ApplicationId, ClusterId, HostName};
use hostgate_policy::StorageNode;

/// Wanted state of a storage node, as understood by the cluster controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Up,
    Maintenance,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => f.write_str("up"),
            Self::Maintenance => f.write_str("maintenance"),
        }
    }
}

/// One requested storage node state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageNodeChange {
    pub application: ApplicationId,
    pub cluster_id: ClusterId,
    pub host: HostName,
    pub config_id: String,
    pub state: NodeState,
}

impl StorageNodeChange {
    pub fn new(application: &ApplicationId, node: &StorageNode<'_>, state: NodeState) -> Self {
        Self {
            application: application.clone(),
            cluster_id: node.cluster_id.clone(),
            host: node.host().clone(),
            config_id: node.config_id().to_string(),
            state,
        }
    }
}

/// Errors reported by the cluster controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterControllerError {
    #[error("cluster controller of cluster '{cluster_id}' refused to set {host} {state}: {reason}")]
    Refused {
        cluster_id: ClusterId,
        host: HostName,
        state: NodeState,
        reason: String,
    },

    #[error("cluster controller unavailable: {0}")]
    Unavailable(String),
}

/// Client for the cluster controller of storage clusters.
pub trait ClusterControllerClient: Send + Sync {
    fn set_node_state(
        &self,
        change: StorageNodeChange,
    ) -> impl Future<Output = Result<(), ClusterControllerError>> + Send;
}

/// In-memory cluster controller that records every accepted change.
///
/// Hosts added with [`refuse`](Self::refuse) get their changes refused.
#[derive(Debug, Clone, Default)]
pub struct RecordingClusterController {
    changes: Arc<Mutex<Vec<StorageNodeChange>>>,
    refused: Arc<Mutex<BTreeSet<HostName>>>,
}

impl RecordingClusterController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every future change for `host`.
    pub async fn refuse(&self, host: impl Into<HostName>) {
        self.refused.lock().await.insert(host.into());
    }

    /// Accepted changes, oldest first.
    pub async fn changes(&self) -> Vec<StorageNodeChange> {
        self.changes.lock().await.clone()
    }
}

impl ClusterControllerClient for RecordingClusterController {
    async fn set_node_state(&self, change: StorageNodeChange) -> Result<(), ClusterControllerError> {
        if self.refused.lock().await.contains(&change.host) {
            return Err(ClusterControllerError::Refused {
                cluster_id: change.cluster_id,
                host: change.host,
                state: change.state,
                reason: "node state change not allowed".to_string(),
            });
        }
        debug!(
            cluster = %change.cluster_id,
            host = %change.host,
            state = %change.state,
            "storage node state set"
        );
        self.changes.lock().await.push(change);
        Ok(())
    }
}
