use connectors::backend::StoreBackend;
use engine_config::{
    report::{console::ConsoleReporter, summary::RunSummary},
    settings::{Operation, RunSettings, validated::RunSettingsBuilder},
};
use engine_core::workload::WorkloadSettings;
use engine_runtime::{error::RunError, execution::executor::run};

pub const TEST_CREDENTIAL: &str = "integration-test-key";
pub const TEST_DATABASE: &str = "bulkdb";
pub const TEST_COLLECTION: &str = "bulkcoll";
pub const TEST_THROUGHPUT: u32 = 400_000;

/// Settings for a run against `endpoint` that creates what is missing.
pub fn settings(endpoint: &str, operation: Operation, size: usize, count: u64) -> RunSettings {
    RunSettingsBuilder::new(operation)
        .endpoint(endpoint)
        .credential(TEST_CREDENTIAL)
        .database(TEST_DATABASE)
        .collection(TEST_COLLECTION)
        .create_collection(true)
        .throughput(Some(TEST_THROUGHPUT))
        .checkpoint_size(size)
        .checkpoint_count(count)
        .workload(WorkloadSettings::default())
        .build()
        .expect("valid test settings")
}

pub fn import(allow_upsert: bool) -> Operation {
    Operation::Import { allow_upsert }
}

pub fn delete(partition_value: Option<&str>) -> Operation {
    Operation::Delete {
        partition_value: partition_value.map(str::to_string),
    }
}

/// Runs to completion and returns the summary with the console output.
pub async fn execute(
    settings: &RunSettings,
    backend: &dyn StoreBackend,
) -> Result<(RunSummary, String), RunError> {
    let mut reporter = ConsoleReporter::new(Vec::new());
    let summary = run(settings, backend, &mut reporter).await?;
    let output = String::from_utf8(reporter.into_inner()).expect("utf-8 report");
    Ok((summary, output))
}

/// Like [`execute`], panicking on error.
pub async fn run_ok(settings: &RunSettings, backend: &dyn StoreBackend) -> RunSummary {
    execute(settings, backend).await.expect("run succeeds").0
}
