use crate::{
    bulk::{BulkExecutor, BulkExecutorConfig},
    embedded::{
        EmbeddedStore,
        budget::CapacityBudget,
        documents_tree_name,
        partition::{MicroBatch, PartitionLayout, by_partition},
    },
    error::BulkError,
};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use model::{
    execution::{
        query::{DeleteQuery, RequestOptions},
        result::{BulkFailure, DeleteResult, ImportResult, UpdateResult},
    },
    records::{document::Document, update::UpdateItem},
};
use serde_json::{Map, Value};
use std::{
    collections::HashSet,
    future::Future,
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};
use tracing::{debug, info};

/// Request units charged per started kilobyte.
const WRITE_UNITS_PER_KB: f64 = 5.0;
const READ_UNITS_PER_KB: f64 = 1.0;

const CAUSE_CONFLICT: &str = "Conflict";
const CAUSE_NOT_FOUND: &str = "NotFound";
const CAUSE_INVALID_DOCUMENT: &str = "InvalidDocument";

fn units_for(bytes: usize, per_kb: f64) -> f64 {
    per_kb * bytes.div_ceil(1024).max(1) as f64
}

/// Documents are keyed `<partition key>\0<id>` so that a partition is a
/// contiguous key prefix.
fn document_key(partition_key: &str, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(partition_key.len() + id.len() + 1);
    key.extend_from_slice(partition_key.as_bytes());
    key.push(0);
    key.extend_from_slice(id.as_bytes());
    key
}

fn partition_prefix(partition_key: &str) -> Vec<u8> {
    let mut prefix = partition_key.as_bytes().to_vec();
    prefix.push(0);
    prefix
}

fn partition_of_key(key: &[u8]) -> String {
    let end = key.iter().position(|b| *b == 0).unwrap_or(key.len());
    String::from_utf8_lossy(&key[..end]).into_owned()
}

struct StagedWrite {
    id: String,
    partition_key: String,
    key: Vec<u8>,
    bytes: Vec<u8>,
}

/// What one partition run achieved.
#[derive(Default)]
struct PartitionOutcome {
    succeeded: u64,
    request_units: f64,
    failures: Vec<(String, String)>,
}

impl PartitionOutcome {
    fn absorb(&mut self, other: PartitionOutcome) {
        self.succeeded += other.succeeded;
        self.request_units += other.request_units;
        self.failures.extend(other.failures);
    }
}

/// Bulk executor over the embedded store.
///
/// Operations are grouped by physical partition. Up to `max_concurrency`
/// partitions are served at once; inside a partition micro-batches are
/// applied in order, each paid for from the shared capacity budget.
pub struct EmbeddedBulkExecutor {
    store: EmbeddedStore,
    docs: sled::Tree,
    partition_key_field: String,
    layout: PartitionLayout,
    budget: CapacityBudget,
    max_concurrency: usize,
    closed: AtomicBool,
}

impl EmbeddedBulkExecutor {
    pub fn new(store: EmbeddedStore, config: &BulkExecutorConfig) -> Result<Self, BulkError> {
        let partition_key_field = config
            .partition_key
            .field_name()
            .map_err(|e| BulkError::InvalidConfig(e.to_string()))?
            .to_string();

        if config.throughput.units_per_second() == 0 {
            return Err(BulkError::InvalidConfig(
                "throughput must be greater than zero".to_string(),
            ));
        }
        if config.max_concurrency == 0 {
            return Err(BulkError::InvalidConfig(
                "max concurrency must be greater than zero".to_string(),
            ));
        }

        let docs = store.tree(&documents_tree_name(
            &config.database_id,
            &config.collection_id,
        ))?;
        let layout = PartitionLayout::for_throughput(config.throughput);

        info!(
            database = %config.database_id,
            collection = %config.collection_id,
            partitions = layout.count(),
            max_concurrency = config.max_concurrency,
            throughput = %config.throughput,
            "Bulk executor ready"
        );

        Ok(Self {
            store,
            docs,
            partition_key_field,
            layout,
            budget: CapacityBudget::new(config.throughput),
            max_concurrency: config.max_concurrency,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), BulkError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BulkError::Closed);
        }
        Ok(())
    }

    fn check_document(&self, doc: &Document) -> Result<(), String> {
        if doc.id.is_empty() {
            return Err(format!("{CAUSE_INVALID_DOCUMENT}: empty id"));
        }
        if doc.get("id").and_then(Value::as_str) != Some(doc.id.as_str()) {
            return Err(format!("{CAUSE_INVALID_DOCUMENT}: body id mismatch"));
        }
        let body_key = doc.get(&self.partition_key_field).and_then(Value::as_str);
        if body_key != Some(doc.partition_key.as_str()) {
            return Err(format!(
                "{CAUSE_INVALID_DOCUMENT}: '{}' does not match the partition key",
                self.partition_key_field
            ));
        }
        Ok(())
    }

    /// Runs `apply` once per partition, at most `max_concurrency` at a time,
    /// and sums the outcomes. The first storage error wins.
    async fn per_partition<T, F, Fut>(
        &self,
        batches: Vec<MicroBatch<T>>,
        apply: F,
    ) -> Result<PartitionOutcome, BulkError>
    where
        F: Fn(Vec<MicroBatch<T>>) -> Fut,
        Fut: Future<Output = Result<PartitionOutcome, BulkError>>,
    {
        let mut runs = stream::iter(by_partition(batches))
            .map(apply)
            .buffer_unordered(self.max_concurrency);

        let mut total = PartitionOutcome::default();
        while let Some(outcome) = runs.next().await {
            total.absorb(outcome?);
        }
        Ok(total)
    }

    async fn import_partition(
        &self,
        batches: Vec<MicroBatch<StagedWrite>>,
        allow_upsert: bool,
    ) -> Result<PartitionOutcome, BulkError> {
        let mut outcome = PartitionOutcome::default();
        // A key always lands in the same partition, so duplicates within one
        // call are caught per run.
        let mut written: HashSet<Vec<u8>> = HashSet::new();

        for batch in batches {
            let mut write = sled::Batch::default();
            let mut charge = 0.0;
            let size = batch.items.len();

            for op in batch.items {
                let exists = written.contains(&op.key) || self.docs.contains_key(&op.key)?;
                if exists && !allow_upsert {
                    charge += READ_UNITS_PER_KB;
                    outcome.failures.push((CAUSE_CONFLICT.to_string(), op.id));
                    continue;
                }

                charge += units_for(op.bytes.len(), WRITE_UNITS_PER_KB);
                write.insert(op.key.clone(), op.bytes);
                written.insert(op.key);
                outcome.succeeded += 1;
            }

            self.budget.acquire(charge).await;
            self.docs.apply_batch(write)?;
            outcome.request_units += charge;
            debug!(partition = batch.partition, size, charge, "Applied import batch");
        }
        Ok(outcome)
    }

    async fn update_partition(
        &self,
        batches: Vec<MicroBatch<UpdateItem>>,
    ) -> Result<PartitionOutcome, BulkError> {
        let mut outcome = PartitionOutcome::default();

        for batch in batches {
            let mut write = sled::Batch::default();
            let mut charge = 0.0;

            for item in batch.items {
                let key = document_key(&item.partition_key, &item.id);
                let Some(bytes) = self.docs.get(&key)? else {
                    charge += READ_UNITS_PER_KB;
                    outcome.failures.push((CAUSE_NOT_FOUND.to_string(), item.id));
                    continue;
                };
                charge += units_for(bytes.len(), READ_UNITS_PER_KB);

                let mut body: Map<String, Value> = serde_json::from_slice(&bytes)?;
                if let Err(err) = item.apply_to(&mut body, &self.partition_key_field) {
                    outcome.failures.push((format!("InvalidUpdate: {err}"), item.id));
                    continue;
                }

                let bytes = serde_json::to_vec(&body)?;
                charge += units_for(bytes.len(), WRITE_UNITS_PER_KB);
                write.insert(key, bytes);
                outcome.succeeded += 1;
            }

            self.budget.acquire(charge).await;
            self.docs.apply_batch(write)?;
            outcome.request_units += charge;
        }
        Ok(outcome)
    }

    async fn delete_partition(
        &self,
        batches: Vec<MicroBatch<(String, Vec<u8>)>>,
    ) -> Result<PartitionOutcome, BulkError> {
        let mut outcome = PartitionOutcome::default();

        for batch in batches {
            let mut write = sled::Batch::default();
            let charge = batch.items.len() as f64 * WRITE_UNITS_PER_KB;
            for (_, key) in batch.items {
                write.remove(key);
                outcome.succeeded += 1;
            }
            self.budget.acquire(charge).await;
            self.docs.apply_batch(write)?;
            outcome.request_units += charge;
        }
        Ok(outcome)
    }
}

#[async_trait]
impl BulkExecutor for EmbeddedBulkExecutor {
    async fn import_all(
        &self,
        documents: Vec<Document>,
        allow_upsert: bool,
    ) -> Result<ImportResult, BulkError> {
        self.ensure_open()?;
        let started = Instant::now();
        let mut rejected = Vec::new();
        let mut staged = Vec::with_capacity(documents.len());

        for doc in documents {
            if let Err(cause) = self.check_document(&doc) {
                rejected.push((cause, doc.id));
                continue;
            }
            staged.push(StagedWrite {
                key: document_key(&doc.partition_key, &doc.id),
                bytes: doc.to_bytes()?,
                id: doc.id,
                partition_key: doc.partition_key,
            });
        }

        let batches = self.layout.micro_batches(
            staged,
            |w| w.partition_key.as_str(),
            |w| w.bytes.len(),
        );
        let mut outcome = self
            .per_partition(batches, |run| self.import_partition(run, allow_upsert))
            .await?;
        rejected.append(&mut outcome.failures);

        let errors = BulkFailure::group(rejected);
        info!(
            imported = outcome.succeeded,
            failed = errors.iter().map(|f| f.ids.len()).sum::<usize>(),
            request_units = outcome.request_units,
            throttled = self.budget.throttled(),
            "Bulk import finished"
        );

        Ok(ImportResult {
            imported: outcome.succeeded,
            elapsed: started.elapsed(),
            request_units: outcome.request_units,
            errors,
        })
    }

    async fn update_all(
        &self,
        items: Vec<UpdateItem>,
        options: &RequestOptions,
    ) -> Result<UpdateResult, BulkError> {
        self.ensure_open()?;
        let started = Instant::now();
        if let Some(partition_key) = &options.partition_key {
            debug!(partition_key = %partition_key, "Update scoped to a single partition");
        }

        let batches = self
            .layout
            .micro_batches(items, |i| i.partition_key.as_str(), |_| 1);
        let outcome = self
            .per_partition(batches, |run| self.update_partition(run))
            .await?;

        let failed_updates = BulkFailure::group(outcome.failures);
        info!(
            updated = outcome.succeeded,
            request_units = outcome.request_units,
            "Bulk update finished"
        );

        Ok(UpdateResult {
            updated: outcome.succeeded,
            elapsed: started.elapsed(),
            request_units: outcome.request_units,
            failed_updates,
        })
    }

    async fn delete_all(
        &self,
        query: &DeleteQuery,
        options: &RequestOptions,
    ) -> Result<DeleteResult, BulkError> {
        self.ensure_open()?;
        let started = Instant::now();
        info!(%query, partition_key = ?options.partition_key, "Bulk delete started");

        let scan = match &options.partition_key {
            Some(partition_key) => self.docs.scan_prefix(partition_prefix(partition_key)),
            None => self.docs.iter(),
        };

        let mut scan_units = 0.0;
        let mut matched = Vec::new();
        for entry in scan {
            let (key, bytes) = entry?;
            scan_units += units_for(bytes.len(), READ_UNITS_PER_KB);
            let body: Map<String, Value> = serde_json::from_slice(&bytes)?;
            if query.matches(&body) {
                matched.push((partition_of_key(&key), key.to_vec()));
            }
        }
        self.budget.acquire(scan_units).await;

        let batches = self.layout.micro_batches(matched, |m| m.0.as_str(), |_| 1);
        let outcome = self
            .per_partition(batches, |run| self.delete_partition(run))
            .await?;
        let request_units = scan_units + outcome.request_units;

        info!(deleted = outcome.succeeded, request_units, "Bulk delete finished");
        Ok(DeleteResult {
            deleted: outcome.succeeded,
            elapsed: started.elapsed(),
            request_units,
        })
    }

    async fn close(&self) -> Result<(), BulkError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.store.flush().await?;
        debug!(throttled = self.budget.throttled(), "Bulk executor closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StoreEndpoint;
    use model::{
        core::{collection::ThroughputAllocation, partition_key::PartitionKeyDefinition},
        records::update::UpdateOperation,
    };
    use std::sync::Arc;

    const PK: &str = "partitionKey";

    fn config(max_concurrency: usize) -> BulkExecutorConfig {
        BulkExecutorConfig {
            endpoint: "memory://".into(),
            credential: "key".into(),
            database_id: "db".into(),
            collection_id: "coll".into(),
            partition_key: PartitionKeyDefinition::single("/partitionKey"),
            throughput: ThroughputAllocation(1_000_000),
            max_concurrency,
        }
    }

    fn executor_with(max_concurrency: usize) -> EmbeddedBulkExecutor {
        let store = EmbeddedStore::open(&StoreEndpoint::Memory(String::new())).unwrap();
        EmbeddedBulkExecutor::new(store, &config(max_concurrency)).unwrap()
    }

    fn executor() -> EmbeddedBulkExecutor {
        executor_with(16)
    }

    fn docs(range: std::ops::Range<u64>) -> Vec<Document> {
        range
            .map(|i| Document::new(i.to_string(), PK, i.to_string()).with_field("f0", "v"))
            .collect()
    }

    #[tokio::test]
    async fn import_then_conflict_then_upsert() {
        let exec = executor();
        let first = exec.import_all(docs(0..50), false).await.unwrap();
        assert_eq!(first.imported, 50);
        assert!(first.errors.is_empty());
        assert!(first.request_units >= 50.0 * WRITE_UNITS_PER_KB);

        let again = exec.import_all(docs(40..60), false).await.unwrap();
        assert_eq!(again.imported, 10);
        assert_eq!(again.errors.len(), 1);
        assert_eq!(again.errors[0].cause, CAUSE_CONFLICT);
        assert_eq!(again.errors[0].ids.len(), 10);

        let upsert = exec.import_all(docs(40..60), true).await.unwrap();
        assert_eq!(upsert.imported, 20);
    }

    #[tokio::test]
    async fn duplicate_ids_in_one_call_conflict() {
        let exec = executor();
        let mut batch = docs(0..3);
        batch.extend(docs(1..2));
        let result = exec.import_all(batch, false).await.unwrap();
        assert_eq!(result.imported, 3);
        assert_eq!(result.errors[0].ids, vec!["1"]);
    }

    #[tokio::test]
    async fn rejects_inconsistent_partition_key() {
        let exec = executor();
        let mut doc = Document::new("1", PK, "1");
        doc.partition_key = "2".into();
        let result = exec.import_all(vec![doc], false).await.unwrap();
        assert_eq!(result.imported, 0);
        assert!(result.errors[0].cause.starts_with(CAUSE_INVALID_DOCUMENT));
    }

    #[tokio::test]
    async fn updates_existing_and_reports_missing() {
        let exec = executor();
        exec.import_all(docs(0..10), false).await.unwrap();

        let ops = Arc::new(vec![
            UpdateOperation::set("f0", "UpdatedDocValue"),
            UpdateOperation::unset("f1"),
        ]);
        let items = (5..15)
            .map(|i| UpdateItem::new(i.to_string(), i.to_string(), ops.clone()))
            .collect();
        let result = exec
            .update_all(items, &RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(result.updated, 5);
        assert_eq!(result.failed_updates[0].cause, CAUSE_NOT_FOUND);
        assert_eq!(result.failed_updates[0].ids.len(), 5);

        let stored = exec.docs.get(document_key("7", "7")).unwrap().unwrap();
        let body: Map<String, Value> = serde_json::from_slice(&stored).unwrap();
        assert_eq!(body["f0"], Value::String("UpdatedDocValue".into()));
    }

    #[tokio::test]
    async fn partition_hint_does_not_change_delete_result() {
        let exec = executor();
        exec.import_all(docs(0..20), false).await.unwrap();
        let query = DeleteQuery::field_equals(PK, "2");

        let hinted = exec
            .delete_all(&query, &RequestOptions::for_partition("2"))
            .await
            .unwrap();
        assert_eq!(hinted.deleted, 1);

        exec.import_all(docs(2..3), false).await.unwrap();
        let unhinted = exec
            .delete_all(&query, &RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(unhinted.deleted, 1);
        assert_eq!(exec.docs.len(), 19);
    }

    #[tokio::test]
    async fn closed_executor_refuses_work() {
        let exec = executor();
        exec.close().await.unwrap();
        assert!(matches!(
            exec.import_all(docs(0..1), false).await,
            Err(BulkError::Closed)
        ));
    }

    #[tokio::test]
    async fn concurrency_does_not_change_results() {
        let serial = executor_with(1);
        let parallel = executor_with(64);

        for exec in [&serial, &parallel] {
            exec.import_all(docs(0..900), false).await.unwrap();
        }
        let a = serial.import_all(docs(850..1_000), false).await.unwrap();
        let b = parallel.import_all(docs(850..1_000), false).await.unwrap();

        assert_eq!(a.imported, 100);
        assert_eq!(b.imported, 100);
        assert_eq!(a.request_units, b.request_units);
        assert_eq!(b.errors[0].cause, CAUSE_CONFLICT);
        assert_eq!(b.errors[0].ids.len(), 50);
        assert_eq!(serial.docs.len(), 1_000);
        assert_eq!(parallel.docs.len(), 1_000);

        let deleted = parallel
            .delete_all(&DeleteQuery::all(), &RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(deleted.deleted, 1_000);
        assert!(parallel.docs.is_empty());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let store = EmbeddedStore::open(&StoreEndpoint::Memory(String::new())).unwrap();
        assert!(matches!(
            EmbeddedBulkExecutor::new(store, &config(0)),
            Err(BulkError::InvalidConfig(_))
        ));
    }
}
