use error::ReportError;
use model::execution::result::BulkFailure;
use summary::{CheckpointStats, RunSummary};

pub mod console;
pub mod error;
pub mod rates;
pub mod summary;

/// Receives the statistics of a run as it progresses. One reporter is
/// created per run and handed to the executor.
pub trait Reporter: Send {
    fn checkpoint(&mut self, stats: &CheckpointStats) -> Result<(), ReportError>;

    /// Called once, for the checkpoint that ended the run early.
    fn failures(&mut self, checkpoint: u64, failures: &[BulkFailure]) -> Result<(), ReportError>;

    fn summary(&mut self, summary: &RunSummary) -> Result<(), ReportError>;
}
