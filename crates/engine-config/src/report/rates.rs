use model::execution::{result::CheckpointResult, totals::RunTotals};
use serde::Serialize;
use std::time::Duration;

/// Throughput derived from a count, a capacity charge and the time both took.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rates {
    pub ops_per_second: f64,
    pub units_per_second: f64,
}

impl Rates {
    /// Zero elapsed time yields zero rates rather than infinities.
    pub fn new(count: u64, request_units: f64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return Self::default();
        }

        Self {
            ops_per_second: count as f64 / secs,
            units_per_second: request_units / secs,
        }
    }

    pub fn of_checkpoint(result: &CheckpointResult) -> Self {
        Self::new(result.succeeded, result.request_units, result.elapsed)
    }

    pub fn of_totals(totals: &RunTotals) -> Self {
        Self::new(totals.succeeded, totals.request_units, totals.elapsed)
    }
}
