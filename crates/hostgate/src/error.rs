//! Orchestrator error types.

use hostgate_model::HostName;
use hostgate_policy::HostStateChangeDenied;
use thiserror::Error;

use crate::cluster_controller::ClusterControllerError;

/// Errors returned by the orchestrator facade.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The state change would violate an availability constraint.
    #[error(transparent)]
    Denied(#[from] HostStateChangeDenied),

    #[error("host status error: {0}")]
    Status(#[from] hostgate_status::StatusError),

    #[error("cluster controller error: {0}")]
    ClusterController(#[from] ClusterControllerError),

    #[error("host not found in any application: {0}")]
    HostNotFound(HostName),

    #[error("configuration error: {0}")]
    Config(String),
}

impl OrchestratorError {
    /// The denial, if this error is one.
    pub fn denial(&self) -> Option<&HostStateChangeDenied> {
        match self {
            Self::Denied(denied) => Some(denied),
            _ => None,
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
