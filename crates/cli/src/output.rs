use crate::error::CliError;
use engine_config::report::{
    Reporter,
    error::ReportError,
    summary::{CheckpointStats, RunSummary},
};
use model::execution::result::BulkFailure;
use std::path::Path;

pub async fn write_report(summary: &RunSummary, path: &Path) -> Result<(), CliError> {
    let report_json = summary.to_json()?;
    tokio::fs::write(path, report_json).await?;
    Ok(())
}

/// Forwards to `inner` and remembers the last run summary, whichever way
/// the run ended.
pub struct SummaryKeeper<R> {
    inner: R,
    summary: Option<RunSummary>,
}

impl<R: Reporter> SummaryKeeper<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            summary: None,
        }
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }
}

impl<R: Reporter> Reporter for SummaryKeeper<R> {
    fn checkpoint(&mut self, stats: &CheckpointStats) -> Result<(), ReportError> {
        self.inner.checkpoint(stats)
    }

    fn failures(&mut self, checkpoint: u64, failures: &[BulkFailure]) -> Result<(), ReportError> {
        self.inner.failures(checkpoint, failures)
    }

    fn summary(&mut self, summary: &RunSummary) -> Result<(), ReportError> {
        self.summary = Some(summary.clone());
        self.inner.summary(summary)
    }
}
