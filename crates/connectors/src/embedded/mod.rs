use crate::{
    backend::{StoreBackend, StoreEndpoint},
    bulk::{BulkExecutor, BulkExecutorConfig},
    control::ControlPlane,
    error::{AdapterError, ControlPlaneError},
};
use async_trait::async_trait;
use futures::lock::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::info;

pub mod budget;
pub mod control;
pub mod executor;
pub mod partition;

use control::EmbeddedControlPlane;
use executor::EmbeddedBulkExecutor;

const META_TREE: &str = "meta";
const CREDENTIAL_KEY: &str = "credential_sha256";

/// A sled database standing in for the remote store.
#[derive(Clone)]
pub struct EmbeddedStore {
    db: sled::Db,
}

impl EmbeddedStore {
    pub fn open(endpoint: &StoreEndpoint) -> Result<Self, ControlPlaneError> {
        let db = match endpoint {
            StoreEndpoint::Memory(_) => sled::Config::new().temporary(true).open()?,
            StoreEndpoint::Sled(path) => sled::open(path)?,
        };
        Ok(Self { db })
    }

    /// Checks the credential against the fingerprint recorded on first use.
    pub fn authorize(&self, credential: &str) -> Result<(), ControlPlaneError> {
        if credential.is_empty() {
            return Err(ControlPlaneError::Unauthorized(
                "credential is empty".to_string(),
            ));
        }

        let fingerprint = format!("{:x}", Sha256::digest(credential.as_bytes()));
        let meta = self.db.open_tree(META_TREE)?;
        let recorded = meta.compare_and_swap(
            CREDENTIAL_KEY,
            None as Option<&[u8]>,
            Some(fingerprint.as_bytes()),
        )?;

        match recorded {
            Ok(()) => Ok(()),
            Err(existing) if existing.current.as_deref() == Some(fingerprint.as_bytes()) => {
                Ok(())
            }
            Err(_) => Err(ControlPlaneError::Unauthorized(
                "credential does not match this store".to_string(),
            )),
        }
    }

    pub(crate) fn tree(&self, name: &str) -> Result<sled::Tree, sled::Error> {
        self.db.open_tree(name)
    }

    pub(crate) async fn flush(&self) -> Result<(), sled::Error> {
        self.db.flush_async().await.map(|_| ())
    }
}

/// Tree holding the documents of one collection.
pub(crate) fn documents_tree_name(database_id: &str, collection_id: &str) -> String {
    format!("docs/{database_id}/{collection_id}")
}

/// Backend for `memory://` and `sled://` endpoints. Stores are opened once
/// per endpoint and shared between the control plane and the executors.
#[derive(Default)]
pub struct EmbeddedBackend {
    stores: Mutex<HashMap<StoreEndpoint, EmbeddedStore>>,
}

impl EmbeddedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    async fn store(
        &self,
        endpoint: &str,
        credential: &str,
    ) -> Result<EmbeddedStore, AdapterError> {
        let endpoint: StoreEndpoint = endpoint.parse()?;
        let mut stores = self.stores.lock().await;

        let store = match stores.get(&endpoint) {
            Some(store) => store.clone(),
            None => {
                info!(%endpoint, "Opening embedded store");
                let store = EmbeddedStore::open(&endpoint)?;
                stores.insert(endpoint, store.clone());
                store
            }
        };

        store.authorize(credential)?;
        Ok(store)
    }
}

#[async_trait]
impl StoreBackend for EmbeddedBackend {
    async fn connect(
        &self,
        endpoint: &str,
        credential: &str,
    ) -> Result<Box<dyn ControlPlane>, AdapterError> {
        let store = self.store(endpoint, credential).await?;
        Ok(Box::new(EmbeddedControlPlane::new(store)))
    }

    async fn bulk_executor(
        &self,
        config: BulkExecutorConfig,
    ) -> Result<Box<dyn BulkExecutor>, AdapterError> {
        let store = self.store(&config.endpoint, &config.credential).await?;
        let executor = EmbeddedBulkExecutor::new(store, &config)?;
        Ok(Box::new(executor))
    }
}
