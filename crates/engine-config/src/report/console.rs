use super::{
    Reporter,
    error::ReportError,
    summary::{CheckpointStats, RunStatus, RunSummary},
};
use model::execution::result::BulkFailure;
use std::io::{self, Stdout, Write};

const RULE: &str = "##########################################################";

/// Ids printed per failure cause before the rest is elided.
const MAX_LISTED_IDS: usize = 10;

/// Human-readable report, one block per checkpoint plus a final block.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn checkpoint(&mut self, stats: &CheckpointStats) -> Result<(), ReportError> {
        let verb = stats.operation.verb();
        writeln!(self.out, "{RULE}")?;
        writeln!(
            self.out,
            "Checkpoint {} (offset {}): {} of {} documents {verb}",
            stats.index, stats.offset, stats.succeeded, stats.expected
        )?;
        writeln!(
            self.out,
            "  Time in this checkpoint:        {:.3} ms",
            stats.elapsed.as_secs_f64() * 1000.0
        )?;
        writeln!(self.out, "  Request units consumed:         {:.2}", stats.request_units)?;
        writeln!(
            self.out,
            "  Average RU/s:                   {:.2}",
            stats.rates.units_per_second
        )?;
        writeln!(
            self.out,
            "  Average documents {verb}/s:   {:.2}",
            stats.rates.ops_per_second
        )?;
        Ok(())
    }

    fn failures(&mut self, checkpoint: u64, failures: &[BulkFailure]) -> Result<(), ReportError> {
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "Checkpoint {checkpoint} did not complete:")?;
        if failures.is_empty() {
            writeln!(self.out, "  (the bulk engine reported no failure details)")?;
        }
        for failure in failures {
            let listed = failure
                .ids
                .iter()
                .take(MAX_LISTED_IDS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            write!(self.out, "  {} ({}): {listed}", failure.cause, failure.ids.len())?;
            if failure.ids.len() > MAX_LISTED_IDS {
                write!(self.out, ", ... {} more", failure.ids.len() - MAX_LISTED_IDS)?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn summary(&mut self, summary: &RunSummary) -> Result<(), ReportError> {
        let verb = summary.operation.verb();
        writeln!(self.out, "{RULE}")?;
        match &summary.status {
            RunStatus::Completed => writeln!(self.out, "Run completed")?,
            RunStatus::Aborted {
                checkpoint,
                expected,
                succeeded,
            } => writeln!(
                self.out,
                "Run aborted at checkpoint {checkpoint}: {succeeded} of {expected} documents {verb}"
            )?,
            RunStatus::Failed { checkpoint, error } => {
                writeln!(self.out, "Run failed at checkpoint {checkpoint}: {error}")?
            }
            RunStatus::NotStarted { error } => {
                writeln!(self.out, "Run stopped before the first checkpoint: {error}")?
            }
        }
        writeln!(self.out, "  Collection:                     {}", summary.collection)?;
        match summary.throughput {
            Some(throughput) => {
                writeln!(self.out, "  Provisioned throughput:         {throughput} RU/s")?
            }
            None => writeln!(self.out, "  Provisioned throughput:         unknown")?,
        }
        writeln!(self.out, "  Checkpoints executed:           {}", summary.checkpoints.len())?;
        writeln!(
            self.out,
            "  Total time measured by engine:  {:.3} ms",
            summary.elapsed.as_secs_f64() * 1000.0
        )?;
        writeln!(
            self.out,
            "  Total time in adapter calls:    {:.3} ms",
            summary.adapter_elapsed.as_secs_f64() * 1000.0
        )?;
        writeln!(
            self.out,
            "  Total time incl. generation:    {:.3} ms",
            summary.wall_time.as_secs_f64() * 1000.0
        )?;
        writeln!(self.out, "  Total documents {verb}:       {}", summary.succeeded)?;
        writeln!(self.out, "  Total request units consumed:   {:.2}", summary.request_units)?;
        writeln!(
            self.out,
            "  Average RU/s:                   {:.2}",
            summary.rates.units_per_second
        )?;
        writeln!(
            self.out,
            "  Average documents {verb}/s:   {:.2}",
            summary.rates.ops_per_second
        )?;
        writeln!(self.out, "{RULE}")?;
        self.out.flush()?;
        Ok(())
    }
}
