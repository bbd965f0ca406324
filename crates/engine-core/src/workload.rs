use crate::error::WorkloadError;
use model::{
    core::partition_key::PartitionKeyDefinition,
    records::{
        document::Document,
        update::{UpdateItem, UpdateOperation},
    },
};
use std::sync::Arc;
use uuid::Uuid;

/// Number of filler fields that brings a generated document to ~1 KB.
pub const DEFAULT_FILLER_FIELDS: usize = 10;

/// Tail appended to the doubled UUID in each filler value (36 + 36 + 13 chars).
const FILLER_TAIL: &str = "0123456789012";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSettings {
    /// Filler fields `f0`..`fN` per inserted document.
    pub filler_fields: usize,
    /// Appends a random token to every id. Updates generated from the same
    /// offsets can no longer find such documents.
    pub random_id_suffix: bool,
}

impl Default for WorkloadSettings {
    fn default() -> Self {
        Self {
            filler_fields: DEFAULT_FILLER_FIELDS,
            random_id_suffix: false,
        }
    }
}

/// Produces the synthetic records of one checkpoint.
///
/// Record `i` of the checkpoint starting at `offset` uses `offset + i` as
/// its partition-key value and id, so update and delete runs can rebuild the
/// same identities from the same offsets.
#[derive(Debug, Clone)]
pub struct WorkloadGenerator {
    partition_key_field: String,
    settings: WorkloadSettings,
}

impl WorkloadGenerator {
    /// Fails before generating anything unless the definition has exactly
    /// one simple path.
    pub fn new(
        partition_key: &PartitionKeyDefinition,
        settings: WorkloadSettings,
    ) -> Result<Self, WorkloadError> {
        let partition_key_field = partition_key.field_name()?.to_string();
        Ok(Self {
            partition_key_field,
            settings,
        })
    }

    pub fn partition_key_field(&self) -> &str {
        &self.partition_key_field
    }

    pub fn insert_batch(&self, count: usize, offset: u64) -> Vec<Document> {
        (0..count as u64).map(|i| self.document(offset + i)).collect()
    }

    fn document(&self, sequence: u64) -> Document {
        let partition_key = sequence.to_string();
        let id = if self.settings.random_id_suffix {
            format!("{partition_key}-{}", Uuid::new_v4().simple())
        } else {
            partition_key.clone()
        };

        let filler = filler_value();
        let mut doc = Document::new(id, &self.partition_key_field, partition_key);
        for j in 0..self.settings.filler_fields {
            doc.body.insert(format!("f{j}"), filler.clone().into());
        }
        doc
    }
}

fn filler_value() -> String {
    let data = Uuid::new_v4().to_string();
    format!("{data}{data}{FILLER_TAIL}")
}

/// Insert workload for one checkpoint.
pub fn generate_insert_batch(
    count: usize,
    partition_key: &PartitionKeyDefinition,
    offset: u64,
) -> Result<Vec<Document>, WorkloadError> {
    let generator = WorkloadGenerator::new(partition_key, WorkloadSettings::default())?;
    Ok(generator.insert_batch(count, offset))
}

/// Update workload for one checkpoint: descriptor `j` targets the record
/// whose id and partition-key value are both `offset + j`.
pub fn generate_update_batch(
    count: usize,
    offset: u64,
    operations: Arc<Vec<UpdateOperation>>,
) -> Vec<UpdateItem> {
    (0..count as u64)
        .map(|j| {
            let key = (offset + j).to_string();
            UpdateItem::new(key.clone(), key, operations.clone())
        })
        .collect()
}

/// Sets `f0` to a literal and removes `f1`.
pub fn default_update_operations() -> Vec<UpdateOperation> {
    vec![
        UpdateOperation::set("f0", "UpdatedDocValue"),
        UpdateOperation::unset("f1"),
    ]
}
