use crate::error::BulkError;
use async_trait::async_trait;
use model::{
    core::{collection::ThroughputAllocation, partition_key::PartitionKeyDefinition},
    execution::{
        query::{DeleteQuery, RequestOptions},
        result::{DeleteResult, ImportResult, UpdateResult},
    },
    records::{document::Document, update::UpdateItem},
};
use std::fmt;

/// Everything needed to build a bulk executor for one collection.
#[derive(Clone)]
pub struct BulkExecutorConfig {
    pub endpoint: String,
    pub credential: String,
    pub database_id: String,
    pub collection_id: String,
    pub partition_key: PartitionKeyDefinition,
    pub throughput: ThroughputAllocation,
    /// Upper bound on physical partitions served at the same time.
    pub max_concurrency: usize,
}

impl fmt::Debug for BulkExecutorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkExecutorConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &"***")
            .field("database_id", &self.database_id)
            .field("collection_id", &self.collection_id)
            .field("partition_key", &self.partition_key)
            .field("throughput", &self.throughput)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

/// Executes large sets of record operations against one collection.
///
/// Implementations batch, pace and retry internally; callers only see the
/// aggregate result. The succeeded count in each result is authoritative.
#[async_trait]
pub trait BulkExecutor: Send + Sync {
    async fn import_all(
        &self,
        documents: Vec<Document>,
        allow_upsert: bool,
    ) -> Result<ImportResult, BulkError>;

    async fn update_all(
        &self,
        items: Vec<UpdateItem>,
        options: &RequestOptions,
    ) -> Result<UpdateResult, BulkError>;

    async fn delete_all(
        &self,
        query: &DeleteQuery,
        options: &RequestOptions,
    ) -> Result<DeleteResult, BulkError>;

    /// Releases the executor. Further calls fail with [`BulkError::Closed`].
    async fn close(&self) -> Result<(), BulkError>;
}
