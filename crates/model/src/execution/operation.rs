use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of mutation a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Import,
    Update,
    Delete,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Import => "import",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        }
    }

    /// Past-tense verb used in reports ("Number of documents inserted").
    pub fn verb(&self) -> &'static str {
        match self {
            OperationKind::Import => "inserted",
            OperationKind::Update => "updated",
            OperationKind::Delete => "deleted",
        }
    }

    /// Whether the operation runs as a sequence of fixed-size checkpoints.
    pub fn is_checkpointed(&self) -> bool {
        !matches!(self, OperationKind::Delete)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
