use connectors::error::ControlPlaneError;
use model::error::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("Invalid partition key definition: {0}")]
    PartitionKey(#[from] ModelError),
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Invalid partition key definition: {0}")]
    PartitionKey(#[from] ModelError),

    /// A control-plane call failed with anything other than "not found".
    #[error("Control plane call for {resource} failed: {source}")]
    ControlPlane {
        resource: String,
        #[source]
        source: ControlPlaneError,
    },

    /// The resource was expected to exist already.
    #[error("{0} does not exist and creation is disabled")]
    Missing(String),

    /// The resource was created but never became readable.
    #[error("{resource} still not readable after {attempts} attempts")]
    NotVisibleAfterCreate { resource: String, attempts: usize },

    #[error("Cannot find the offer of collection {collection} (resource id {resource_id})")]
    OfferNotFound {
        collection: String,
        resource_id: String,
    },
}
