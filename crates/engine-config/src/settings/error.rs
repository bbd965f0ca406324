use model::error::ModelError;
use thiserror::Error;

/// Configuration problems, all detected before any remote call.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Setting {0} must be greater than zero")]
    Zero(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("Invalid partition key: {0}")]
    PartitionKey(#[from] ModelError),

    /// `checkpoint_size * checkpoint_count` does not fit the offset space.
    #[error("{count} checkpoints of {size} records overflow the record offset")]
    OffsetOverflow { size: usize, count: u64 },
}
