use async_trait::async_trait;
use connectors::{
    backend::StoreBackend,
    bulk::{BulkExecutor, BulkExecutorConfig},
    control::ControlPlane,
    error::{AdapterError, BulkError, ControlPlaneError},
};
use engine_config::report::{
    Reporter,
    error::ReportError,
    summary::{CheckpointStats, RunSummary},
};
use model::{
    core::{
        collection::{Collection, CollectionDefinition, Database, Offer},
        partition_key::PartitionKeyDefinition,
    },
    execution::{
        query::{DeleteQuery, RequestOptions},
        result::{BulkFailure, DeleteResult, ImportResult, UpdateResult},
    },
    records::{document::Document, update::UpdateItem},
};
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Import {
        count: usize,
        first_id: Option<String>,
        allow_upsert: bool,
    },
    Update {
        count: usize,
        first_id: Option<String>,
    },
    Delete {
        query: DeleteQuery,
        options: RequestOptions,
    },
}

/// How the mock engine and control plane answer.
#[derive(Debug, Clone)]
pub struct Script {
    /// Call index whose result comes back one record short.
    pub short_at: Option<usize>,
    /// Call index that fails as a whole.
    pub fail_at: Option<usize>,
    pub elapsed_per_call: Duration,
    pub units_per_record: f64,
    pub deleted: u64,
    pub missing_offer: bool,
    /// Partition key of the collection the control plane hands out.
    pub partition_key: &'static str,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            short_at: None,
            fail_at: None,
            elapsed_per_call: Duration::from_secs(1),
            units_per_record: 5.0,
            deleted: 0,
            missing_offer: false,
            partition_key: "/partitionKey",
        }
    }
}

#[derive(Default)]
pub struct Recorder {
    pub calls: Mutex<Vec<EngineCall>>,
    pub configs: Mutex<Vec<BulkExecutorConfig>>,
    pub connects: AtomicUsize,
    pub control_closes: AtomicUsize,
    pub engine_closes: AtomicUsize,
    pub replaced_throughput: Mutex<Option<u32>>,
}

impl Recorder {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn control_closes(&self) -> usize {
        self.control_closes.load(Ordering::SeqCst)
    }

    pub fn engine_closes(&self) -> usize {
        self.engine_closes.load(Ordering::SeqCst)
    }

    pub fn engines_created(&self) -> usize {
        self.configs.lock().unwrap().len()
    }
}

pub struct MockBackend {
    pub script: Script,
    pub recorder: Arc<Recorder>,
}

impl MockBackend {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            recorder: Arc::new(Recorder::default()),
        }
    }
}

#[async_trait]
impl StoreBackend for MockBackend {
    async fn connect(
        &self,
        _endpoint: &str,
        _credential: &str,
    ) -> Result<Box<dyn ControlPlane>, AdapterError> {
        self.recorder.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockControlPlane {
            script: self.script.clone(),
            recorder: self.recorder.clone(),
        }))
    }

    async fn bulk_executor(
        &self,
        config: BulkExecutorConfig,
    ) -> Result<Box<dyn BulkExecutor>, AdapterError> {
        self.recorder.configs.lock().unwrap().push(config);
        Ok(Box::new(MockEngine {
            script: self.script.clone(),
            recorder: self.recorder.clone(),
        }))
    }
}

/// Database and collection always exist.
struct MockControlPlane {
    script: Script,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn read_database(&self, id: &str) -> Result<Database, ControlPlaneError> {
        Ok(Database {
            id: id.to_string(),
            rid: "rid-db".into(),
        })
    }

    async fn create_database(&self, id: &str) -> Result<Database, ControlPlaneError> {
        Err(ControlPlaneError::Conflict(id.to_string()))
    }

    async fn read_collection(
        &self,
        database_id: &str,
        id: &str,
    ) -> Result<Collection, ControlPlaneError> {
        Ok(Collection {
            id: id.to_string(),
            database_id: database_id.to_string(),
            rid: "rid-coll".into(),
            partition_key: PartitionKeyDefinition::single(self.script.partition_key),
        })
    }

    async fn create_collection(
        &self,
        _database_id: &str,
        definition: &CollectionDefinition,
        _initial_throughput: Option<u32>,
    ) -> Result<Collection, ControlPlaneError> {
        Err(ControlPlaneError::Conflict(definition.id.clone()))
    }

    async fn query_offer_for_resource(
        &self,
        resource_id: &str,
    ) -> Result<Option<Offer>, ControlPlaneError> {
        if self.script.missing_offer {
            return Ok(None);
        }
        Ok(Some(Offer {
            id: "offer-coll".into(),
            resource_id: resource_id.to_string(),
            throughput: 400,
        }))
    }

    async fn replace_offer(
        &self,
        offer: &Offer,
        throughput: u32,
    ) -> Result<Offer, ControlPlaneError> {
        *self.recorder.replaced_throughput.lock().unwrap() = Some(throughput);
        Ok(Offer {
            throughput,
            ..offer.clone()
        })
    }

    async fn close(&self) -> Result<(), ControlPlaneError> {
        self.recorder.control_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockEngine {
    script: Script,
    recorder: Arc<Recorder>,
}

impl MockEngine {
    /// Logs the call and returns its index, or the scripted failure.
    fn record(&self, call: EngineCall) -> Result<usize, BulkError> {
        let mut calls = self.recorder.calls.lock().unwrap();
        calls.push(call);
        let index = calls.len() - 1;
        if self.script.fail_at == Some(index) {
            return Err(BulkError::Storage("disk on fire".into()));
        }
        Ok(index)
    }

    /// Succeeded count and failures for a call over `ids`.
    fn outcome(&self, index: usize, ids: Vec<String>) -> (u64, Vec<BulkFailure>) {
        let count = ids.len() as u64;
        if self.script.short_at != Some(index) {
            return (count, Vec::new());
        }
        let failed = ids.into_iter().last().map(|id| ("Conflict".to_string(), id));
        (count - 1, BulkFailure::group(failed))
    }
}

#[async_trait]
impl BulkExecutor for MockEngine {
    async fn import_all(
        &self,
        documents: Vec<Document>,
        allow_upsert: bool,
    ) -> Result<ImportResult, BulkError> {
        let index = self.record(EngineCall::Import {
            count: documents.len(),
            first_id: documents.first().map(|d| d.id.clone()),
            allow_upsert,
        })?;
        let (imported, errors) =
            self.outcome(index, documents.into_iter().map(|d| d.id).collect());
        Ok(ImportResult {
            imported,
            elapsed: self.script.elapsed_per_call,
            request_units: imported as f64 * self.script.units_per_record,
            errors,
        })
    }

    async fn update_all(
        &self,
        items: Vec<UpdateItem>,
        _options: &RequestOptions,
    ) -> Result<UpdateResult, BulkError> {
        let index = self.record(EngineCall::Update {
            count: items.len(),
            first_id: items.first().map(|i| i.id.clone()),
        })?;
        let (updated, failed_updates) =
            self.outcome(index, items.into_iter().map(|i| i.id).collect());
        Ok(UpdateResult {
            updated,
            elapsed: self.script.elapsed_per_call,
            request_units: updated as f64 * self.script.units_per_record,
            failed_updates,
        })
    }

    async fn delete_all(
        &self,
        query: &DeleteQuery,
        options: &RequestOptions,
    ) -> Result<DeleteResult, BulkError> {
        self.record(EngineCall::Delete {
            query: query.clone(),
            options: options.clone(),
        })?;
        Ok(DeleteResult {
            deleted: self.script.deleted,
            elapsed: self.script.elapsed_per_call,
            request_units: self.script.deleted as f64 * self.script.units_per_record,
        })
    }

    async fn close(&self) -> Result<(), BulkError> {
        self.recorder.engine_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Keeps everything it is handed.
#[derive(Default)]
pub struct RecordingReporter {
    pub checkpoints: Vec<CheckpointStats>,
    pub failures: Vec<(u64, Vec<BulkFailure>)>,
    pub summaries: Vec<RunSummary>,
}

impl Reporter for RecordingReporter {
    fn checkpoint(&mut self, stats: &CheckpointStats) -> Result<(), ReportError> {
        self.checkpoints.push(stats.clone());
        Ok(())
    }

    fn failures(&mut self, checkpoint: u64, failures: &[BulkFailure]) -> Result<(), ReportError> {
        self.failures.push((checkpoint, failures.to_vec()));
        Ok(())
    }

    fn summary(&mut self, summary: &RunSummary) -> Result<(), ReportError> {
        self.summaries.push(summary.clone());
        Ok(())
    }
}
