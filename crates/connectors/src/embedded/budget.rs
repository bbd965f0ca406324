use model::core::collection::ThroughputAllocation;
use std::{sync::Mutex, time::Duration};
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Token bucket holding at most one second worth of request units.
///
/// Callers wait for capacity instead of failing, so throttling is absorbed
/// inside the executor and only shows up as elapsed time.
pub struct CapacityBudget {
    rate: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    available: f64,
    last_refill: Instant,
    throttled: u64,
}

impl CapacityBudget {
    pub fn new(throughput: ThroughputAllocation) -> Self {
        let rate = f64::from(throughput.units_per_second());
        Self {
            rate,
            state: Mutex::new(BucketState {
                available: rate,
                last_refill: Instant::now(),
                throttled: 0,
            }),
        }
    }

    /// Spends `units`, waiting until the bucket can cover them. A charge
    /// larger than the bucket is admitted once the bucket is full and leaves
    /// it in debt.
    pub async fn acquire(&self, units: f64) {
        if self.rate <= 0.0 || units <= 0.0 {
            return;
        }

        loop {
            let wait = {
                let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                let now = Instant::now();
                let refill = now.duration_since(state.last_refill).as_secs_f64() * self.rate;
                state.available = (state.available + refill).min(self.rate);
                state.last_refill = now;

                let needed = units.min(self.rate);
                if state.available >= needed {
                    state.available -= units;
                    return;
                }

                state.throttled += 1;
                Duration::from_secs_f64((needed - state.available) / self.rate)
            };

            debug!(wait_ms = wait.as_millis(), units, "Request units exhausted, waiting");
            sleep(wait).await;
        }
    }

    /// How many times a caller had to wait for capacity.
    pub fn throttled(&self) -> u64 {
        self.state.lock().map(|s| s.throttled).unwrap_or(0)
    }
}
