use super::{error::ReportError, rates::Rates};
use chrono::{DateTime, Utc};
use model::execution::{
    operation::OperationKind,
    result::{BulkFailure, CheckpointResult},
    totals::RunTotals,
};
use serde::{Serialize, Serializer};
use std::time::Duration;

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_micros() as f64 / 1000.0)
}

/// Statistics of one adapter invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointStats {
    pub operation: OperationKind,
    pub index: u64,
    pub offset: u64,
    pub expected: u64,
    pub succeeded: u64,
    pub failed: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    pub request_units: f64,
    pub rates: Rates,
}

impl CheckpointStats {
    pub fn new(
        operation: OperationKind,
        index: u64,
        offset: u64,
        expected: u64,
        result: &CheckpointResult,
    ) -> Self {
        Self {
            operation,
            index,
            offset,
            expected,
            succeeded: result.succeeded,
            failed: result.failed_count(),
            elapsed: result.elapsed,
            request_units: result.request_units,
            rates: Rates::of_checkpoint(result),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.succeeded == self.expected
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// A checkpoint reported fewer successes than it submitted.
    Aborted {
        checkpoint: u64,
        expected: u64,
        succeeded: u64,
    },
    /// The adapter call itself failed.
    Failed { checkpoint: u64, error: String },
    /// Connecting, provisioning or building the executor failed.
    NotStarted { error: String },
}

/// Everything known about a run once it stops.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub operation: OperationKind,
    pub status: RunStatus,
    pub collection: String,
    /// Unknown when the run stopped before the offer was read.
    pub throughput: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Start to finish, including data generation and provisioning.
    #[serde(rename = "wall_time_ms", serialize_with = "as_millis")]
    pub wall_time: Duration,
    pub succeeded: u64,
    /// Sum of the durations the bulk engine reported.
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// Wall time spent inside adapter calls, as measured by the caller.
    #[serde(rename = "adapter_elapsed_ms", serialize_with = "as_millis")]
    pub adapter_elapsed: Duration,
    pub request_units: f64,
    pub rates: Rates,
    pub checkpoints: Vec<CheckpointStats>,
    pub failures: Vec<BulkFailure>,
}

impl RunSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        operation: OperationKind,
        status: RunStatus,
        collection: String,
        throughput: u32,
        started_at: DateTime<Utc>,
        totals: &RunTotals,
        adapter_elapsed: Duration,
        checkpoints: Vec<CheckpointStats>,
        failures: Vec<BulkFailure>,
    ) -> Self {
        let finished_at = Utc::now();
        Self {
            operation,
            status,
            collection,
            throughput: Some(throughput),
            started_at,
            finished_at,
            wall_time: (finished_at - started_at).to_std().unwrap_or_default(),
            succeeded: totals.succeeded,
            elapsed: totals.elapsed,
            adapter_elapsed,
            request_units: totals.request_units,
            rates: Rates::of_totals(totals),
            checkpoints,
            failures,
        }
    }

    /// Summary of a run that failed before its first checkpoint.
    pub fn not_started(
        operation: OperationKind,
        collection: String,
        started_at: DateTime<Utc>,
        error: String,
    ) -> Self {
        let totals = RunTotals::default();
        Self {
            throughput: None,
            ..Self::new(
                operation,
                RunStatus::NotStarted { error },
                collection,
                0,
                started_at,
                &totals,
                Duration::ZERO,
                Vec::new(),
                Vec::new(),
            )
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
