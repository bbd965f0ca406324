use model::core::collection::ThroughputAllocation;
use xxhash_rust::xxh3::xxh3_64;

/// Throughput one physical partition can serve.
pub const THROUGHPUT_PER_PARTITION: u32 = 10_000;
pub const MAX_PARTITIONS: u32 = 256;

/// Upper bounds for a single micro-batch sent to one partition.
pub const MAX_BATCH_OPERATIONS: usize = 100;
pub const MAX_BATCH_BYTES: usize = 220 * 1024;

/// Operations bound for the same physical partition.
#[derive(Debug)]
pub struct MicroBatch<T> {
    pub partition: u32,
    pub items: Vec<T>,
}

/// Maps partition-key values onto physical partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionLayout {
    count: u32,
}

impl PartitionLayout {
    pub fn for_throughput(throughput: ThroughputAllocation) -> Self {
        let count = throughput
            .units_per_second()
            .div_ceil(THROUGHPUT_PER_PARTITION)
            .clamp(1, MAX_PARTITIONS);
        Self { count }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn partition_of(&self, key: &str) -> u32 {
        (xxh3_64(key.as_bytes()) % u64::from(self.count)) as u32
    }

    /// Groups items by partition and cuts each group into micro-batches
    /// bounded by [`MAX_BATCH_OPERATIONS`] and [`MAX_BATCH_BYTES`]. Relative
    /// order inside a partition is preserved.
    pub fn micro_batches<T, K, S>(&self, items: Vec<T>, key: K, size: S) -> Vec<MicroBatch<T>>
    where
        K: Fn(&T) -> &str,
        S: Fn(&T) -> usize,
    {
        let mut buckets: Vec<Vec<T>> = (0..self.count).map(|_| Vec::new()).collect();
        for item in items {
            let partition = self.partition_of(key(&item));
            buckets[partition as usize].push(item);
        }

        let mut batches = Vec::new();
        for (partition, bucket) in buckets.into_iter().enumerate() {
            let partition = partition as u32;
            let mut current = Vec::new();
            let mut current_bytes = 0;

            for item in bucket {
                let item_bytes = size(&item);
                let full = current.len() >= MAX_BATCH_OPERATIONS
                    || current_bytes + item_bytes > MAX_BATCH_BYTES;
                if !current.is_empty() && full {
                    batches.push(MicroBatch {
                        partition,
                        items: std::mem::take(&mut current),
                    });
                    current_bytes = 0;
                }
                current_bytes += item_bytes;
                current.push(item);
            }

            if !current.is_empty() {
                batches.push(MicroBatch {
                    partition,
                    items: current,
                });
            }
        }
        batches
    }
}

/// Splits micro-batches into one run per partition. Batch order inside a
/// partition is kept, so a run can be applied sequentially while different
/// runs proceed concurrently.
pub fn by_partition<T>(batches: Vec<MicroBatch<T>>) -> Vec<Vec<MicroBatch<T>>> {
    let mut runs: Vec<Vec<MicroBatch<T>>> = Vec::new();
    for batch in batches {
        match runs.last_mut() {
            Some(run) if run.last().is_some_and(|b| b.partition == batch.partition) => {
                run.push(batch)
            }
            _ => runs.push(vec![batch]),
        }
    }
    runs
}
