use connectors::{bulk::BulkExecutor, error::BulkError};
use engine_config::settings::{Operation, RunSettings};
use engine_core::{
    error::WorkloadError,
    workload::{WorkloadGenerator, default_update_operations, generate_update_batch},
};
use model::{
    core::partition_key::PartitionKeyDefinition,
    execution::{
        query::{DeleteQuery, RequestOptions},
        result::CheckpointResult,
    },
    records::{
        document::Document,
        update::{UpdateItem, UpdateOperation},
    },
};
use std::sync::Arc;

/// What each checkpoint of a run submits.
#[derive(Debug, Clone)]
pub enum CheckpointWorkload {
    Import {
        generator: WorkloadGenerator,
        allow_upsert: bool,
    },
    Update {
        operations: Arc<Vec<UpdateOperation>>,
    },
    Delete {
        query: DeleteQuery,
        options: RequestOptions,
    },
}

impl CheckpointWorkload {
    /// Workload for a collection partitioned by `partition_key`. Generated
    /// documents and the delete filter use that key, not the one requested
    /// in the settings.
    pub fn for_collection(
        settings: &RunSettings,
        partition_key: &PartitionKeyDefinition,
    ) -> Result<Self, WorkloadError> {
        let generator = WorkloadGenerator::new(partition_key, settings.workload.clone())?;

        Ok(match &settings.operation {
            Operation::Import { allow_upsert } => CheckpointWorkload::Import {
                generator,
                allow_upsert: *allow_upsert,
            },
            Operation::Update => CheckpointWorkload::Update {
                operations: Arc::new(default_update_operations()),
            },
            Operation::Delete {
                partition_value: Some(value),
            } => CheckpointWorkload::Delete {
                query: DeleteQuery::field_equals(generator.partition_key_field(), value.clone()),
                options: RequestOptions::for_partition(value.clone()),
            },
            Operation::Delete {
                partition_value: None,
            } => CheckpointWorkload::Delete {
                query: DeleteQuery::all(),
                options: RequestOptions::default(),
            },
        })
    }

    /// Materializes the checkpoint covering `[offset, offset + count)`.
    pub fn batch(&self, offset: u64, count: usize) -> CheckpointBatch {
        match self {
            CheckpointWorkload::Import {
                generator,
                allow_upsert,
            } => CheckpointBatch::Import {
                documents: generator.insert_batch(count, offset),
                allow_upsert: *allow_upsert,
            },
            CheckpointWorkload::Update { operations } => CheckpointBatch::Update {
                items: generate_update_batch(count, offset, operations.clone()),
            },
            CheckpointWorkload::Delete { query, options } => CheckpointBatch::Delete {
                query: query.clone(),
                options: options.clone(),
            },
        }
    }
}

/// One checkpoint's worth of work, ready for a single adapter call.
#[derive(Debug)]
pub enum CheckpointBatch {
    Import {
        documents: Vec<Document>,
        allow_upsert: bool,
    },
    Update {
        items: Vec<UpdateItem>,
    },
    Delete {
        query: DeleteQuery,
        options: RequestOptions,
    },
}

impl CheckpointBatch {
    /// Successes a complete checkpoint reports. Unknown for deletes.
    pub fn expected(&self) -> Option<u64> {
        match self {
            CheckpointBatch::Import { documents, .. } => Some(documents.len() as u64),
            CheckpointBatch::Update { items } => Some(items.len() as u64),
            CheckpointBatch::Delete { .. } => None,
        }
    }

    pub async fn submit(self, engine: &dyn BulkExecutor) -> Result<CheckpointResult, BulkError> {
        match self {
            CheckpointBatch::Import {
                documents,
                allow_upsert,
            } => Ok(engine.import_all(documents, allow_upsert).await?.into()),
            CheckpointBatch::Update { items } => Ok(engine
                .update_all(items, &RequestOptions::default())
                .await?
                .into()),
            CheckpointBatch::Delete { query, options } => {
                Ok(engine.delete_all(&query, &options).await?.into())
            }
        }
    }
}
