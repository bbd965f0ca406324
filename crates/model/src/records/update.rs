use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A field-level change applied to an existing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum UpdateOperation {
    Set { field: String, value: Value },
    Unset { field: String },
}

impl UpdateOperation {
    pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Self {
        UpdateOperation::Set {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn unset(field: impl Into<String>) -> Self {
        UpdateOperation::Unset {
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            UpdateOperation::Set { field, .. } | UpdateOperation::Unset { field } => field,
        }
    }

    /// Applies the operation to a record body. `Set` creates missing fields,
    /// `Unset` ignores them.
    pub fn apply(&self, body: &mut Map<String, Value>) {
        match self {
            UpdateOperation::Set { field, value } => {
                body.insert(field.clone(), value.clone());
            }
            UpdateOperation::Unset { field } => {
                body.remove(field);
            }
        }
    }
}

/// Identifies one existing record and the operations to apply to it.
///
/// The operation list is shared by every descriptor of a checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItem {
    pub id: String,
    pub partition_key: String,
    pub operations: Arc<Vec<UpdateOperation>>,
}

impl UpdateItem {
    pub fn new(
        id: impl Into<String>,
        partition_key: impl Into<String>,
        operations: Arc<Vec<UpdateOperation>>,
    ) -> Self {
        Self {
            id: id.into(),
            partition_key: partition_key.into(),
            operations,
        }
    }

    /// Applies every operation in order, refusing to touch `id` or the
    /// partition-key field.
    pub fn apply_to(
        &self,
        body: &mut Map<String, Value>,
        partition_key_field: &str,
    ) -> Result<(), ModelError> {
        if let Some(op) = self
            .operations
            .iter()
            .find(|op| op.field() == "id" || op.field() == partition_key_field)
        {
            return Err(ModelError::ProtectedField(op.field().to_string()));
        }

        for op in self.operations.iter() {
            op.apply(body);
        }
        Ok(())
    }
}
