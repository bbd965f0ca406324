use crate::error::ControlPlaneError;
use async_trait::async_trait;
use model::core::collection::{Collection, CollectionDefinition, Database, Offer};

/// Metadata operations against the remote store. Every lookup reports a
/// missing resource as [`ControlPlaneError::NotFound`].
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn read_database(&self, id: &str) -> Result<Database, ControlPlaneError>;

    async fn create_database(&self, id: &str) -> Result<Database, ControlPlaneError>;

    async fn read_collection(
        &self,
        database_id: &str,
        id: &str,
    ) -> Result<Collection, ControlPlaneError>;

    /// Creates the collection; `initial_throughput` provisions its offer.
    async fn create_collection(
        &self,
        database_id: &str,
        definition: &CollectionDefinition,
        initial_throughput: Option<u32>,
    ) -> Result<Collection, ControlPlaneError>;

    async fn query_offer_for_resource(
        &self,
        resource_id: &str,
    ) -> Result<Option<Offer>, ControlPlaneError>;

    async fn replace_offer(&self, offer: &Offer, throughput: u32)
    -> Result<Offer, ControlPlaneError>;

    /// Releases the connection. Calls after the first are no-ops.
    async fn close(&self) -> Result<(), ControlPlaneError>;
}
