//! Error types for the host-status registry.

use hostgate_model::ApplicationId;
use thiserror::Error;

/// Result type alias for registry operations.
pub type StatusResult<T> = Result<T, StatusError>;

/// Errors that can occur while reading or writing host status.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("timed out after {timeout_secs}s waiting for the lock of {application}")]
    LockTimeout {
        application: ApplicationId,
        timeout_secs: u64,
    },
}
