use engine_core::{
    provision::{ProvisionMode, ProvisionRequest},
    workload::WorkloadSettings,
};
use model::{core::partition_key::PartitionKeyDefinition, execution::operation::OperationKind};
use std::fmt;

pub mod error;
pub mod validated;

pub const DEFAULT_PARTITION_KEY_PATH: &str = "/partitionKey";
pub const DEFAULT_THROUGHPUT: u32 = 1_000_000;
pub const DEFAULT_CHECKPOINT_SIZE: usize = 500_000;
pub const DEFAULT_CHECKPOINT_COUNT: u64 = 10;
pub const DEFAULT_DELETE_PARTITION_VALUE: &str = "2";
pub const DEFAULT_MAX_CONNECTION_POOL_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Inserts synthetic records; with `allow_upsert` existing ids are overwritten.
    Import { allow_upsert: bool },
    /// Applies the same field operations to the records of each checkpoint.
    Update,
    /// One delete call, scoped to a single partition-key value when given.
    Delete { partition_value: Option<String> },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Import { .. } => OperationKind::Import,
            Operation::Update => OperationKind::Update,
            Operation::Delete { .. } => OperationKind::Delete,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Import { allow_upsert } => write!(f, "import (upsert: {allow_upsert})"),
            Operation::Update => f.write_str("update"),
            Operation::Delete {
                partition_value: Some(value),
            } => write!(f, "delete (partition value: {value:?})"),
            Operation::Delete {
                partition_value: None,
            } => f.write_str("delete (all partitions)"),
        }
    }
}

/// Immutable, validated configuration of one run. Built through
/// [`validated::RunSettingsBuilder`].
#[derive(Clone, PartialEq)]
pub struct RunSettings {
    pub operation: Operation,
    pub endpoint: String,
    pub credential: String,
    pub database_id: String,
    pub collection_id: String,
    /// Create the database and collection when missing.
    pub create_collection: bool,
    pub throughput: Option<u32>,
    pub partition_key: PartitionKeyDefinition,
    pub checkpoint_size: usize,
    pub checkpoint_count: u64,
    /// Physical partitions the bulk executor may serve at the same time.
    pub max_connection_pool_size: usize,
    pub workload: WorkloadSettings,
}

impl RunSettings {
    /// First record offset of checkpoint `index`.
    pub fn checkpoint_offset(&self, index: u64) -> u64 {
        index * self.checkpoint_size as u64
    }

    /// Number of adapter calls a fully successful run makes.
    pub fn planned_checkpoints(&self) -> u64 {
        if self.operation.kind().is_checkpointed() {
            self.checkpoint_count
        } else {
            1
        }
    }

    pub fn provision_request(&self) -> ProvisionRequest {
        let (mode, throughput) = if self.create_collection {
            (
                ProvisionMode::CreateIfMissing,
                Some(self.throughput.unwrap_or(DEFAULT_THROUGHPUT)),
            )
        } else {
            (ProvisionMode::MustExist, self.throughput)
        };

        ProvisionRequest {
            database_id: self.database_id.clone(),
            collection_id: self.collection_id.clone(),
            partition_key: self.partition_key.clone(),
            throughput,
            mode,
        }
    }
}

// Written out by hand so the credential never reaches a log line.
impl fmt::Display for RunSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "operation:          {}", self.operation)?;
        writeln!(f, "endpoint:           {}", self.endpoint)?;
        writeln!(f, "credential:         ****")?;
        writeln!(f, "database:           {}", self.database_id)?;
        writeln!(f, "collection:         {}", self.collection_id)?;
        writeln!(f, "create collection:  {}", self.create_collection)?;
        match self.throughput {
            Some(t) => writeln!(f, "throughput:         {t}")?,
            None => writeln!(f, "throughput:         unchanged")?,
        }
        writeln!(f, "partition key:      {}", self.partition_key.paths.join(","))?;
        writeln!(f, "checkpoint size:    {}", self.checkpoint_size)?;
        writeln!(f, "checkpoints:        {}", self.checkpoint_count)?;
        write!(f, "connection pool:    {}", self.max_connection_pool_size)
    }
}

impl fmt::Debug for RunSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunSettings")
            .field("operation", &self.operation)
            .field("endpoint", &self.endpoint)
            .field("credential", &"****")
            .field("database_id", &self.database_id)
            .field("collection_id", &self.collection_id)
            .field("create_collection", &self.create_collection)
            .field("throughput", &self.throughput)
            .field("partition_key", &self.partition_key)
            .field("checkpoint_size", &self.checkpoint_size)
            .field("checkpoint_count", &self.checkpoint_count)
            .field("max_connection_pool_size", &self.max_connection_pool_size)
            .field("workload", &self.workload)
            .finish()
    }
}
