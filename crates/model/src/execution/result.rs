use serde::Serialize;
use std::{collections::BTreeMap, time::Duration};

/// Records that failed for the same cause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkFailure {
    pub cause: String,
    pub ids: Vec<String>,
}

impl BulkFailure {
    /// Groups `(cause, id)` pairs by cause, keeping ids in arrival order.
    pub fn group<I>(failures: I) -> Vec<BulkFailure>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (cause, id) in failures {
            grouped.entry(cause).or_default().push(id);
        }
        grouped
            .into_iter()
            .map(|(cause, ids)| BulkFailure { cause, ids })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportResult {
    pub imported: u64,
    pub elapsed: Duration,
    pub request_units: f64,
    pub errors: Vec<BulkFailure>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    pub updated: u64,
    pub elapsed: Duration,
    pub request_units: f64,
    pub failed_updates: Vec<BulkFailure>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteResult {
    pub deleted: u64,
    pub elapsed: Duration,
    pub request_units: f64,
}

/// Outcome of one adapter invocation, whatever the operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointResult {
    pub succeeded: u64,
    pub elapsed: Duration,
    pub request_units: f64,
    pub failures: Vec<BulkFailure>,
}

impl CheckpointResult {
    pub fn failed_count(&self) -> usize {
        self.failures.iter().map(|f| f.ids.len()).sum()
    }
}

impl From<ImportResult> for CheckpointResult {
    fn from(r: ImportResult) -> Self {
        CheckpointResult {
            succeeded: r.imported,
            elapsed: r.elapsed,
            request_units: r.request_units,
            failures: r.errors,
        }
    }
}

impl From<UpdateResult> for CheckpointResult {
    fn from(r: UpdateResult) -> Self {
        CheckpointResult {
            succeeded: r.updated,
            elapsed: r.elapsed,
            request_units: r.request_units,
            failures: r.failed_updates,
        }
    }
}

impl From<DeleteResult> for CheckpointResult {
    fn from(r: DeleteResult) -> Self {
        CheckpointResult {
            succeeded: r.deleted,
            elapsed: r.elapsed,
            request_units: r.request_units,
            failures: Vec::new(),
        }
    }
}
