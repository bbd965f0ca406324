use thiserror::Error;

/// Failures reported by the store's control plane.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// The resource does not exist. Provisioning treats this as expected.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A create raced with another creator of the same resource.
    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection closed")]
    Closed,
}

impl ControlPlaneError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ControlPlaneError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ControlPlaneError::Conflict(_))
    }
}

impl From<sled::Error> for ControlPlaneError {
    fn from(err: sled::Error) -> Self {
        ControlPlaneError::Storage(err.to_string())
    }
}

/// Failures of a whole bulk call. Per-record failures are not errors; they
/// come back inside the call's result.
#[derive(Debug, Error)]
pub enum BulkError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Bulk executor already closed")]
    Closed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<sled::Error> for BulkError {
    fn from(err: sled::Error) -> Self {
        BulkError::Storage(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    /// The endpoint scheme has no backend.
    #[error("Unsupported endpoint: {0}")]
    UnsupportedEndpoint(String),

    #[error("Control plane error: {0}")]
    ControlPlane(#[from] ControlPlaneError),

    #[error("Bulk executor error: {0}")]
    Bulk(#[from] BulkError),

    #[error("Missing required property: {0}")]
    MissingProperty(String),
}
