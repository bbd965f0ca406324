use connectors::error::{AdapterError, BulkError};
use engine_core::error::{ProvisionError, WorkloadError};
use thiserror::Error;

/// Errors that stop a run before it can report a status of its own.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Workload error: {0}")]
    Workload(#[from] WorkloadError),

    /// Connecting to the store or building the bulk executor failed.
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    /// The bulk call of a checkpoint failed as a whole.
    #[error("Bulk call of checkpoint {checkpoint} failed: {source}")]
    Bulk {
        checkpoint: u64,
        #[source]
        source: BulkError,
    },
}
