use crate::{
    error::RunError,
    execution::{factory, workload::CheckpointWorkload},
};
use chrono::{DateTime, Utc};
use connectors::{backend::StoreBackend, bulk::BulkExecutor, control::ControlPlane};
use engine_config::{
    report::{
        Reporter,
        error::ReportError,
        summary::{CheckpointStats, RunStatus, RunSummary},
    },
    settings::RunSettings,
};
use engine_core::{
    error::WorkloadError,
    provision::{CollectionProvisioner, Provisioned},
};
use model::{
    core::collection::Collection,
    execution::{result::BulkFailure, totals::RunTotals},
};
use std::{fmt, time::Duration};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Provisioning,
    Looping(u64),
    Completed,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Provisioning => f.write_str("provisioning"),
            RunState::Looping(i) => write!(f, "looping({i})"),
            RunState::Completed => f.write_str("completed"),
            RunState::Aborted => f.write_str("aborted"),
        }
    }
}

/// Runs one bulk operation: provision the collection, then submit the
/// checkpoints one after another until all succeed or one comes back short.
///
/// A short checkpoint ends the run with [`RunStatus::Aborted`] in an `Ok`
/// summary; errors are reserved for failures that leave no meaningful
/// status (configuration, connection, provisioning, a failed bulk call).
/// Every path after validation hands the reporter a summary. The
/// control-plane connection and the bulk executor are closed exactly once
/// on every path once acquired.
pub async fn run(
    settings: &RunSettings,
    backend: &dyn StoreBackend,
    reporter: &mut dyn Reporter,
) -> Result<RunSummary, RunError> {
    let started_at = Utc::now();
    settings
        .partition_key
        .field_name()
        .map_err(WorkloadError::from)?;

    info!(operation = %settings.operation, endpoint = %settings.endpoint, "Connecting to store");
    let control = match backend
        .connect(&settings.endpoint, &settings.credential)
        .await
    {
        Ok(control) => control,
        Err(err) => return Err(not_started(settings, reporter, started_at, err.into())),
    };

    let outcome =
        provision_and_execute(settings, backend, control.as_ref(), reporter, started_at).await;

    if let Err(err) = control.close().await {
        warn!(error = %err, "Failed to close control-plane connection");
    }
    outcome
}

/// What a run needs before its first checkpoint.
struct Prepared {
    provisioned: Provisioned,
    workload: CheckpointWorkload,
    engine: Box<dyn BulkExecutor>,
}

async fn provision_and_execute(
    settings: &RunSettings,
    backend: &dyn StoreBackend,
    control: &dyn ControlPlane,
    reporter: &mut dyn Reporter,
    started_at: DateTime<Utc>,
) -> Result<RunSummary, RunError> {
    let Prepared {
        provisioned,
        workload,
        engine,
    } = match prepare(settings, backend, control).await {
        Ok(prepared) => prepared,
        Err(err) => return Err(not_started(settings, reporter, started_at, err)),
    };

    let outcome = CheckpointExecutor::new(settings, &provisioned, workload, reporter, started_at)
        .execute(engine.as_ref())
        .await;

    if let Err(err) = engine.close().await {
        warn!(error = %err, "Failed to close bulk executor");
    }
    outcome
}

async fn prepare(
    settings: &RunSettings,
    backend: &dyn StoreBackend,
    control: &dyn ControlPlane,
) -> Result<Prepared, RunError> {
    info!(
        state = %RunState::Provisioning,
        database = %settings.database_id,
        collection = %settings.collection_id,
        "Ensuring collection"
    );
    let provisioned = CollectionProvisioner::new(control)
        .ensure_collection(&settings.provision_request())
        .await?;

    // Documents and delete filters follow the collection as it exists.
    let workload =
        CheckpointWorkload::for_collection(settings, &provisioned.collection.partition_key)?;
    let engine = factory::create_bulk_executor(backend, settings, &provisioned).await?;

    Ok(Prepared {
        provisioned,
        workload,
        engine,
    })
}

/// Reports a run that never reached its first checkpoint and hands the
/// error back.
fn not_started(
    settings: &RunSettings,
    reporter: &mut dyn Reporter,
    started_at: DateTime<Utc>,
    err: RunError,
) -> RunError {
    error!(state = %RunState::Aborted, error = %err, "Run could not start");
    let summary = RunSummary::not_started(
        settings.operation.kind(),
        Collection::link_for(&settings.database_id, &settings.collection_id),
        started_at,
        err.to_string(),
    );
    report(reporter.summary(&summary));
    err
}

struct CheckpointExecutor<'a> {
    settings: &'a RunSettings,
    provisioned: &'a Provisioned,
    workload: CheckpointWorkload,
    reporter: &'a mut dyn Reporter,
    started_at: DateTime<Utc>,
    totals: RunTotals,
    checkpoints: Vec<CheckpointStats>,
    /// Time spent inside adapter calls only.
    adapter_elapsed: Duration,
}

impl<'a> CheckpointExecutor<'a> {
    fn new(
        settings: &'a RunSettings,
        provisioned: &'a Provisioned,
        workload: CheckpointWorkload,
        reporter: &'a mut dyn Reporter,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            settings,
            provisioned,
            workload,
            reporter,
            started_at,
            totals: RunTotals::default(),
            checkpoints: Vec::new(),
            adapter_elapsed: Duration::ZERO,
        }
    }

    async fn execute(mut self, engine: &dyn BulkExecutor) -> Result<RunSummary, RunError> {
        let kind = self.settings.operation.kind();
        let planned = self.settings.planned_checkpoints();

        for index in 0..planned {
            let offset = self.settings.checkpoint_offset(index);
            let batch = self.workload.batch(offset, self.settings.checkpoint_size);
            let expected = batch.expected();
            debug!(
                state = %RunState::Looping(index),
                offset,
                ?expected,
                "Submitting checkpoint"
            );

            let stopwatch = Instant::now();
            let outcome = batch.submit(engine).await;
            self.adapter_elapsed += stopwatch.elapsed();

            let result = match outcome {
                Ok(result) => result,
                Err(source) => {
                    error!(
                        state = %RunState::Aborted,
                        checkpoint = index,
                        error = %source,
                        "Bulk call failed"
                    );
                    let status = RunStatus::Failed {
                        checkpoint: index,
                        error: source.to_string(),
                    };
                    self.finish(status, Vec::new());
                    return Err(RunError::Bulk {
                        checkpoint: index,
                        source,
                    });
                }
            };

            self.totals.absorb(&result);
            let expected = expected.unwrap_or(result.succeeded);
            let stats = CheckpointStats::new(kind, index, offset, expected, &result);
            info!(
                checkpoint = index,
                succeeded = result.succeeded,
                expected,
                request_units = result.request_units,
                elapsed_ms = result.elapsed.as_millis() as u64,
                "Checkpoint finished"
            );
            report(self.reporter.checkpoint(&stats));
            self.checkpoints.push(stats);

            if result.succeeded != expected {
                warn!(
                    state = %RunState::Aborted,
                    checkpoint = index,
                    expected,
                    succeeded = result.succeeded,
                    failed = result.failed_count(),
                    "Checkpoint incomplete, aborting run"
                );
                report(self.reporter.failures(index, &result.failures));
                let status = RunStatus::Aborted {
                    checkpoint: index,
                    expected,
                    succeeded: result.succeeded,
                };
                return Ok(self.finish(status, result.failures));
            }
        }

        info!(
            state = %RunState::Completed,
            checkpoints = self.totals.checkpoints,
            succeeded = self.totals.succeeded,
            request_units = self.totals.request_units,
            "Run finished"
        );
        Ok(self.finish(RunStatus::Completed, Vec::new()))
    }

    fn finish(&mut self, status: RunStatus, failures: Vec<BulkFailure>) -> RunSummary {
        let summary = RunSummary::new(
            self.settings.operation.kind(),
            status,
            self.provisioned.collection.link(),
            self.provisioned.throughput.units_per_second(),
            self.started_at,
            &self.totals,
            self.adapter_elapsed,
            std::mem::take(&mut self.checkpoints),
            failures,
        );
        report(self.reporter.summary(&summary));
        summary
    }
}

/// The report is diagnostic output; failing to write it never fails the run.
fn report(result: Result<(), ReportError>) {
    if let Err(err) = result {
        warn!(error = %err, "Failed to write report");
    }
}
