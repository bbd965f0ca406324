use crate::execution::result::CheckpointResult;
use serde::Serialize;
use std::time::Duration;

/// Counters accumulated across the checkpoints of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunTotals {
    pub succeeded: u64,
    /// Sum of the elapsed times reported by the bulk engine.
    pub elapsed: Duration,
    pub request_units: f64,
    pub checkpoints: usize,
}

impl RunTotals {
    pub fn absorb(&mut self, result: &CheckpointResult) {
        self.succeeded += result.succeeded;
        self.elapsed += result.elapsed;
        self.request_units += result.request_units;
        self.checkpoints += 1;
    }
}
