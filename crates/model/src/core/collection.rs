use crate::core::partition_key::PartitionKeyDefinition;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub id: String,
    /// Store-assigned resource id.
    pub rid: String,
}

/// What the caller asks the control plane to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionDefinition {
    pub id: String,
    pub partition_key: PartitionKeyDefinition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub database_id: String,
    pub rid: String,
    pub partition_key: PartitionKeyDefinition,
}

impl Collection {
    pub fn link(&self) -> String {
        Self::link_for(&self.database_id, &self.id)
    }

    pub fn link_for(database_id: &str, collection_id: &str) -> String {
        format!("/dbs/{database_id}/colls/{collection_id}")
    }
}

/// Provisioned-throughput setting attached to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub resource_id: String,
    pub throughput: u32,
}

/// Capacity units per second available to the collection for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThroughputAllocation(pub u32);

impl ThroughputAllocation {
    pub fn units_per_second(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ThroughputAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} RU/s", self.0)
    }
}
