use crate::{
    control::ControlPlane,
    embedded::{EmbeddedStore, documents_tree_name},
    error::ControlPlaneError,
};
use async_trait::async_trait;
use model::core::collection::{Collection, CollectionDefinition, Database, Offer};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};
use uuid::Uuid;

const DATABASES_TREE: &str = "databases";
const COLLECTIONS_TREE: &str = "collections";
const OFFERS_TREE: &str = "offers";

pub struct EmbeddedControlPlane {
    store: EmbeddedStore,
    closed: AtomicBool,
}

impl EmbeddedControlPlane {
    pub fn new(store: EmbeddedStore) -> Self {
        Self {
            store,
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), ControlPlaneError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ControlPlaneError::Closed);
        }
        Ok(())
    }

    fn get<T: DeserializeOwned>(
        &self,
        tree: &str,
        key: &str,
    ) -> Result<Option<T>, ControlPlaneError> {
        match self.store.tree(tree)?.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Inserts `value` only if `key` is vacant.
    fn insert_new<T: Serialize>(
        &self,
        tree: &str,
        key: &str,
        value: &T,
    ) -> Result<(), ControlPlaneError> {
        let bytes = serde_json::to_vec(value)?;
        self.store
            .tree(tree)?
            .compare_and_swap(key, None as Option<&[u8]>, Some(bytes))?
            .map_err(|_| ControlPlaneError::Conflict(key.to_string()))
    }

    fn collection_key(database_id: &str, id: &str) -> String {
        format!("{database_id}/{id}")
    }
}

fn new_rid() -> String {
    Uuid::new_v4().simple().to_string()
}

#[async_trait]
impl ControlPlane for EmbeddedControlPlane {
    async fn read_database(&self, id: &str) -> Result<Database, ControlPlaneError> {
        self.ensure_open()?;
        self.get(DATABASES_TREE, id)?
            .ok_or_else(|| ControlPlaneError::NotFound(format!("/dbs/{id}")))
    }

    async fn create_database(&self, id: &str) -> Result<Database, ControlPlaneError> {
        self.ensure_open()?;
        let database = Database {
            id: id.to_string(),
            rid: new_rid(),
        };
        self.insert_new(DATABASES_TREE, id, &database)?;
        info!(database = id, "Created database");
        Ok(database)
    }

    async fn read_collection(
        &self,
        database_id: &str,
        id: &str,
    ) -> Result<Collection, ControlPlaneError> {
        self.ensure_open()?;
        self.get(COLLECTIONS_TREE, &Self::collection_key(database_id, id))?
            .ok_or_else(|| ControlPlaneError::NotFound(format!("/dbs/{database_id}/colls/{id}")))
    }

    async fn create_collection(
        &self,
        database_id: &str,
        definition: &CollectionDefinition,
        initial_throughput: Option<u32>,
    ) -> Result<Collection, ControlPlaneError> {
        self.ensure_open()?;
        self.read_database(database_id).await?;

        let collection = Collection {
            id: definition.id.clone(),
            database_id: database_id.to_string(),
            rid: new_rid(),
            partition_key: definition.partition_key.clone(),
        };
        self.insert_new(
            COLLECTIONS_TREE,
            &Self::collection_key(database_id, &definition.id),
            &collection,
        )?;
        self.store
            .tree(&documents_tree_name(database_id, &definition.id))?;

        if let Some(throughput) = initial_throughput {
            let offer = Offer {
                id: new_rid(),
                resource_id: collection.rid.clone(),
                throughput,
            };
            self.insert_new(OFFERS_TREE, &offer.id, &offer)?;
        }

        info!(
            database = database_id,
            collection = %definition.id,
            throughput = ?initial_throughput,
            "Created collection"
        );
        Ok(collection)
    }

    async fn query_offer_for_resource(
        &self,
        resource_id: &str,
    ) -> Result<Option<Offer>, ControlPlaneError> {
        self.ensure_open()?;
        for entry in self.store.tree(OFFERS_TREE)?.iter() {
            let (_, bytes) = entry?;
            let offer: Offer = serde_json::from_slice(&bytes)?;
            if offer.resource_id == resource_id {
                return Ok(Some(offer));
            }
        }
        Ok(None)
    }

    async fn replace_offer(
        &self,
        offer: &Offer,
        throughput: u32,
    ) -> Result<Offer, ControlPlaneError> {
        self.ensure_open()?;
        let tree = self.store.tree(OFFERS_TREE)?;
        if !tree.contains_key(&offer.id)? {
            return Err(ControlPlaneError::NotFound(format!("/offers/{}", offer.id)));
        }

        let updated = Offer {
            throughput,
            ..offer.clone()
        };
        tree.insert(&offer.id, serde_json::to_vec(&updated)?)?;
        debug!(offer = %offer.id, from = offer.throughput, to = throughput, "Replaced offer");
        Ok(updated)
    }

    async fn close(&self) -> Result<(), ControlPlaneError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.store.flush().await?;
        Ok(())
    }
}
