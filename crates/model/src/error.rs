use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The partition key definition has no paths.
    #[error("there is no partition key definition")]
    MissingPartitionKey,

    /// More than one path; only simple keys are supported.
    #[error("only a single partition key path is supported, got {0} paths")]
    CompositePartitionKey(usize),

    /// The path is empty or points into a nested object.
    #[error("partition key path '{0}' is not a simple top-level path")]
    NestedPartitionKey(String),

    /// An update operation tried to modify the record identity.
    #[error("field '{0}' identifies the record and cannot be updated")]
    ProtectedField(String),
}
