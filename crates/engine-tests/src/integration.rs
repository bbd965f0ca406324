#[cfg(test)]
mod tests {
    use crate::utils::{
        TEST_COLLECTION, TEST_CREDENTIAL, TEST_THROUGHPUT, delete, execute, import, run_ok,
        settings,
    };
    use connectors::{
        embedded::EmbeddedBackend,
        error::{AdapterError, ControlPlaneError},
    };
    use engine_config::{report::summary::RunStatus, settings::Operation};
    use engine_core::error::ProvisionError;
    use engine_runtime::error::RunError;
    use model::core::partition_key::PartitionKeyDefinition;
    use serde_json::Value;
    use tracing_test::traced_test;

    const ENDPOINT: &str = "memory://integration";

    // Scenario: empty store; import, update, then delete one partition and the rest.
    // Expected Outcome: every run completes and each step sees the records the
    // previous one left behind.
    #[traced_test]
    #[tokio::test]
    async fn tc01_import_update_delete() {
        let backend = EmbeddedBackend::new();

        let imported = run_ok(&settings(ENDPOINT, import(false), 50, 3), &backend).await;
        assert_eq!(imported.status, RunStatus::Completed);
        assert_eq!(imported.succeeded, 150);
        assert_eq!(imported.checkpoints.len(), 3);
        assert!(imported.request_units > 0.0);
        assert_eq!(imported.throughput, Some(TEST_THROUGHPUT));

        let updated = run_ok(&settings(ENDPOINT, Operation::Update, 50, 3), &backend).await;
        assert_eq!(updated.status, RunStatus::Completed);
        assert_eq!(updated.succeeded, 150);

        let scoped = run_ok(&settings(ENDPOINT, delete(Some("2")), 50, 3), &backend).await;
        assert_eq!(scoped.status, RunStatus::Completed);
        assert_eq!(scoped.succeeded, 1);
        assert_eq!(scoped.checkpoints.len(), 1);

        let rest = run_ok(&settings(ENDPOINT, delete(None), 50, 3), &backend).await;
        assert_eq!(rest.succeeded, 149);

        assert!(logs_contain("Attempting to create since non-existent"));
        assert!(logs_contain("Checkpoint finished"));
    }

    // Scenario: the same checkpoint range is imported twice without upsert.
    // Expected Outcome: the second run aborts at checkpoint 0 with every id
    // reported as a conflict.
    #[traced_test]
    #[tokio::test]
    async fn tc02_reimport_conflicts() {
        let backend = EmbeddedBackend::new();
        run_ok(&settings(ENDPOINT, import(false), 20, 1), &backend).await;

        let (summary, output) = execute(&settings(ENDPOINT, import(false), 20, 2), &backend)
            .await
            .unwrap();

        assert_eq!(
            summary.status,
            RunStatus::Aborted {
                checkpoint: 0,
                expected: 20,
                succeeded: 0,
            }
        );
        assert_eq!(summary.checkpoints.len(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].cause, "Conflict");
        assert_eq!(summary.failures[0].ids.len(), 20);
        assert!(output.contains("Checkpoint 0 did not complete"));
        assert!(output.contains("Run aborted at checkpoint 0"));
        assert!(logs_contain("aborting run"));
    }

    // Scenario: the conflicting import is re-run with upsert.
    // Expected Outcome: the run completes and overwrites the existing records.
    #[traced_test]
    #[tokio::test]
    async fn tc03_upsert_overwrites() {
        let backend = EmbeddedBackend::new();
        run_ok(&settings(ENDPOINT, import(false), 20, 1), &backend).await;

        let summary = run_ok(&settings(ENDPOINT, import(true), 20, 2), &backend).await;

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.succeeded, 40);
    }

    // Scenario: updates run past the range that was imported.
    // Expected Outcome: the first checkpoint completes, the second aborts with
    // "not found" failures.
    #[traced_test]
    #[tokio::test]
    async fn tc04_update_past_imported_range() {
        let backend = EmbeddedBackend::new();
        run_ok(&settings(ENDPOINT, import(false), 20, 1), &backend).await;

        let summary = run_ok(&settings(ENDPOINT, Operation::Update, 20, 3), &backend).await;

        assert!(matches!(
            summary.status,
            RunStatus::Aborted { checkpoint: 1, .. }
        ));
        assert_eq!(summary.succeeded, 20);
        assert_eq!(summary.failures[0].cause, "NotFound");
        assert_eq!(summary.failures[0].ids.len(), 20);
        assert!(summary.failures[0].ids.contains(&"20".to_string()));
    }

    // Scenario: the collection must already exist but the store is empty.
    // Expected Outcome: provisioning fails, nothing is created.
    #[traced_test]
    #[tokio::test]
    async fn tc05_must_exist_on_empty_store() {
        let backend = EmbeddedBackend::new();
        let mut s = settings(ENDPOINT, Operation::Update, 10, 1);
        s.create_collection = false;

        let err = execute(&s, &backend).await.unwrap_err();

        assert!(matches!(
            err,
            RunError::Provision(ProvisionError::Missing(_))
        ));
        assert!(logs_contain("Run could not start"));
    }

    // Scenario: a second run presents a different credential.
    // Expected Outcome: the connection is refused before provisioning.
    #[traced_test]
    #[tokio::test]
    async fn tc06_foreign_credential_is_refused() {
        let backend = EmbeddedBackend::new();
        run_ok(&settings(ENDPOINT, import(false), 10, 1), &backend).await;

        let mut s = settings(ENDPOINT, Operation::Update, 10, 1);
        s.credential = format!("{TEST_CREDENTIAL}-other");
        let err = execute(&s, &backend).await.unwrap_err();

        assert!(matches!(
            err,
            RunError::Adapter(AdapterError::ControlPlane(
                ControlPlaneError::Unauthorized(_)
            ))
        ));
    }

    // Scenario: an on-disk store serves consecutive runs.
    // Expected Outcome: the update run finds what the import run wrote, and the
    // store directory is populated.
    #[traced_test]
    #[tokio::test]
    async fn tc07_sled_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = format!("sled://{}", dir.path().join("store").display());
        let backend = EmbeddedBackend::new();

        run_ok(&settings(&endpoint, import(false), 25, 2), &backend).await;
        let summary = run_ok(&settings(&endpoint, Operation::Update, 25, 2), &backend).await;

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.succeeded, 50);
        assert!(dir.path().join("store").read_dir().unwrap().next().is_some());
    }

    // Scenario: the run summary is serialized for `--report`.
    // Expected Outcome: the JSON carries the status, totals and checkpoints.
    #[traced_test]
    #[tokio::test]
    async fn tc08_summary_serializes() {
        let backend = EmbeddedBackend::new();
        let (summary, output) = execute(&settings(ENDPOINT, import(false), 10, 2), &backend)
            .await
            .unwrap();

        let json: Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["status"]["state"], "completed");
        assert_eq!(json["succeeded"], 20);
        assert_eq!(json["checkpoints"].as_array().unwrap().len(), 2);
        assert_eq!(
            json["collection"],
            format!("/dbs/bulkdb/colls/{TEST_COLLECTION}")
        );
        assert!(output.contains("Run completed"));
        assert!(output.contains("Total documents inserted:       20"));
        assert!(json["wall_time_ms"].as_f64().unwrap() >= 0.0);
    }

    // Scenario: a collection partitioned by /tenant is reused by runs that keep
    // the default partition-key flag.
    // Expected Outcome: documents, updates and deletes follow the collection's
    // key and every run completes.
    #[traced_test]
    #[tokio::test]
    async fn tc09_existing_collection_key_wins() {
        let backend = EmbeddedBackend::new();
        let mut create = settings(ENDPOINT, import(false), 5, 1);
        create.partition_key = PartitionKeyDefinition::single("/tenant");
        run_ok(&create, &backend).await;

        let reuse = |operation| {
            let mut s = settings(ENDPOINT, operation, 5, 1);
            s.create_collection = false;
            s
        };

        let upserted = run_ok(&reuse(import(true)), &backend).await;
        assert_eq!(upserted.status, RunStatus::Completed);
        assert_eq!(upserted.succeeded, 5);

        let updated = run_ok(&reuse(Operation::Update), &backend).await;
        assert_eq!(updated.status, RunStatus::Completed);
        assert_eq!(updated.succeeded, 5);

        let scoped = run_ok(&reuse(delete(Some("2"))), &backend).await;
        assert_eq!(scoped.succeeded, 1);
        let rest = run_ok(&reuse(delete(None)), &backend).await;
        assert_eq!(rest.succeeded, 4);

        assert!(logs_contain("keeping the collection's"));
    }
}
