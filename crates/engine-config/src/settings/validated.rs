use super::{
    DEFAULT_CHECKPOINT_COUNT, DEFAULT_CHECKPOINT_SIZE, DEFAULT_MAX_CONNECTION_POOL_SIZE,
    DEFAULT_PARTITION_KEY_PATH, Operation, RunSettings, error::SettingsError,
};
use engine_core::workload::WorkloadSettings;
use model::core::partition_key::PartitionKeyDefinition;

/// Collects raw run options and turns them into [`RunSettings`], rejecting
/// anything that would only fail later against the store.
#[derive(Debug, Clone)]
pub struct RunSettingsBuilder {
    operation: Operation,
    endpoint: Option<String>,
    credential: Option<String>,
    database_id: Option<String>,
    collection_id: Option<String>,
    create_collection: bool,
    throughput: Option<u32>,
    partition_key_path: Option<String>,
    checkpoint_size: Option<usize>,
    checkpoint_count: Option<u64>,
    max_connection_pool_size: Option<usize>,
    workload: WorkloadSettings,
}

impl RunSettingsBuilder {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            endpoint: None,
            credential: None,
            database_id: None,
            collection_id: None,
            create_collection: false,
            throughput: None,
            partition_key_path: None,
            checkpoint_size: None,
            checkpoint_count: None,
            max_connection_pool_size: None,
            workload: WorkloadSettings::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn database(mut self, id: impl Into<String>) -> Self {
        self.database_id = Some(id.into());
        self
    }

    pub fn collection(mut self, id: impl Into<String>) -> Self {
        self.collection_id = Some(id.into());
        self
    }

    pub fn create_collection(mut self, create: bool) -> Self {
        self.create_collection = create;
        self
    }

    pub fn throughput(mut self, throughput: Option<u32>) -> Self {
        self.throughput = throughput;
        self
    }

    pub fn partition_key_path(mut self, path: impl Into<String>) -> Self {
        self.partition_key_path = Some(path.into());
        self
    }

    pub fn checkpoint_size(mut self, size: usize) -> Self {
        self.checkpoint_size = Some(size);
        self
    }

    pub fn checkpoint_count(mut self, count: u64) -> Self {
        self.checkpoint_count = Some(count);
        self
    }

    pub fn max_connection_pool_size(mut self, size: usize) -> Self {
        self.max_connection_pool_size = Some(size);
        self
    }

    pub fn workload(mut self, workload: WorkloadSettings) -> Self {
        self.workload = workload;
        self
    }

    pub fn build(self) -> Result<RunSettings, SettingsError> {
        let endpoint = required("endpoint", self.endpoint)?;
        let credential = required("credential", self.credential)?;
        let database_id = resource_id("database id", self.database_id)?;
        let collection_id = resource_id("collection id", self.collection_id)?;

        let partition_key = PartitionKeyDefinition::single(
            self.partition_key_path
                .unwrap_or_else(|| DEFAULT_PARTITION_KEY_PATH.to_string()),
        );
        partition_key.field_name()?;

        if self.throughput == Some(0) {
            return Err(SettingsError::Zero("throughput"));
        }

        let checkpoint_size = self.checkpoint_size.unwrap_or(DEFAULT_CHECKPOINT_SIZE);
        let checkpoint_count = self.checkpoint_count.unwrap_or(DEFAULT_CHECKPOINT_COUNT);
        if checkpoint_size == 0 {
            return Err(SettingsError::Zero("checkpoint size"));
        }
        if checkpoint_count == 0 {
            return Err(SettingsError::Zero("checkpoint count"));
        }
        if (checkpoint_size as u64).checked_mul(checkpoint_count).is_none() {
            return Err(SettingsError::OffsetOverflow {
                size: checkpoint_size,
                count: checkpoint_count,
            });
        }

        let max_connection_pool_size = self
            .max_connection_pool_size
            .unwrap_or(DEFAULT_MAX_CONNECTION_POOL_SIZE);
        if max_connection_pool_size == 0 {
            return Err(SettingsError::Zero("max connection pool size"));
        }

        if let Operation::Delete {
            partition_value: Some(value),
        } = &self.operation
        {
            if value.is_empty() {
                return Err(SettingsError::Invalid {
                    name: "partition value",
                    reason: "must not be empty".into(),
                });
            }
        }

        Ok(RunSettings {
            operation: self.operation,
            endpoint,
            credential,
            database_id,
            collection_id,
            create_collection: self.create_collection,
            throughput: self.throughput,
            partition_key,
            checkpoint_size,
            checkpoint_count,
            max_connection_pool_size,
            workload: self.workload,
        })
    }
}

fn required(name: &'static str, value: Option<String>) -> Result<String, SettingsError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SettingsError::Missing(name)),
    }
}

fn resource_id(name: &'static str, value: Option<String>) -> Result<String, SettingsError> {
    let id = required(name, value)?;
    if id.contains(['/', '\\', '?', '#']) {
        return Err(SettingsError::Invalid {
            name,
            reason: format!("{id:?} contains a reserved character"),
        });
    }
    Ok(id)
}
