use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Ordered set of key paths describing how records are spread across
/// physical partitions, e.g. `["/partitionKey"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionKeyDefinition {
    pub paths: Vec<String>,
}

impl PartitionKeyDefinition {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn single(path: impl Into<String>) -> Self {
        Self {
            paths: vec![path.into()],
        }
    }

    /// Returns the name of the record field holding the partition key.
    ///
    /// Only one top-level path is accepted; `"/pk"` and `"pk"` both resolve
    /// to `pk`, while `"/a/b"` or a multi-path definition is rejected.
    pub fn field_name(&self) -> Result<&str, ModelError> {
        let path = match self.paths.as_slice() {
            [] => return Err(ModelError::MissingPartitionKey),
            [path] => path,
            paths => return Err(ModelError::CompositePartitionKey(paths.len())),
        };

        let name = path.strip_prefix('/').unwrap_or(path);
        if name.is_empty() || name.contains('/') {
            return Err(ModelError::NestedPartitionKey(path.clone()));
        }

        Ok(name)
    }
}
