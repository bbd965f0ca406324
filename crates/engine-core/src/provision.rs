use crate::{
    error::ProvisionError,
    retry::{RetryDisposition, RetryError, RetryPolicy},
};
use connectors::{control::ControlPlane, error::ControlPlaneError};
use model::core::{
    collection::{Collection, CollectionDefinition, ThroughputAllocation},
    partition_key::PartitionKeyDefinition,
};
use std::future::Future;
use tracing::{info, warn};

/// Throughput a freshly created collection starts with before the
/// requested value is applied to its offer.
pub const INITIAL_COLLECTION_THROUGHPUT: u32 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionMode {
    /// Create the database and collection when they are missing.
    CreateIfMissing,
    /// Both must already exist; nothing is created.
    MustExist,
}

#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub database_id: String,
    pub collection_id: String,
    pub partition_key: PartitionKeyDefinition,
    /// Applied to the collection's offer when set.
    pub throughput: Option<u32>,
    pub mode: ProvisionMode,
}

#[derive(Debug, Clone)]
pub struct Provisioned {
    pub collection: Collection,
    pub throughput: ThroughputAllocation,
}

/// How a resource was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Existing,
    Created,
    /// Our create lost a race against another creator.
    CreatedConcurrently,
}

/// Makes sure the target collection exists with the requested throughput.
///
/// A missing resource moves through `NotFound -> Creating -> Created`: at
/// most one create is issued, and the read that follows it is what gets
/// returned. That read is retried only while the store still answers
/// "not found", and only up to the retry policy's limit.
pub struct CollectionProvisioner<'a> {
    control: &'a dyn ControlPlane,
    reread: RetryPolicy,
    initial_throughput: u32,
}

impl<'a> CollectionProvisioner<'a> {
    pub fn new(control: &'a dyn ControlPlane) -> Self {
        Self {
            control,
            reread: RetryPolicy::for_control_plane(),
            initial_throughput: INITIAL_COLLECTION_THROUGHPUT,
        }
    }

    pub fn with_retry(mut self, reread: RetryPolicy) -> Self {
        self.reread = reread;
        self
    }

    pub async fn ensure_collection(
        &self,
        request: &ProvisionRequest,
    ) -> Result<Provisioned, ProvisionError> {
        request.partition_key.field_name()?;

        let database_id = request.database_id.as_str();
        let database_link = format!("/dbs/{database_id}");
        let collection_link = format!("{database_link}/colls/{}", request.collection_id);

        let read_database = || self.control.read_database(database_id);
        let (database, resolution) = match request.mode {
            ProvisionMode::CreateIfMissing => {
                self.resolve(&database_link, read_database, || {
                    self.control.create_database(database_id)
                })
                .await?
            }
            ProvisionMode::MustExist => self.read_existing(&database_link, read_database).await?,
        };
        info!(database = %database.id, ?resolution, "Database ready");

        let definition = CollectionDefinition {
            id: request.collection_id.clone(),
            partition_key: request.partition_key.clone(),
        };
        let read_collection = || self.control.read_collection(database_id, &definition.id);
        let (collection, resolution) = match request.mode {
            ProvisionMode::CreateIfMissing => {
                self.resolve(&collection_link, read_collection, || {
                    self.control.create_collection(
                        database_id,
                        &definition,
                        Some(self.initial_throughput),
                    )
                })
                .await?
            }
            ProvisionMode::MustExist => {
                self.read_existing(&collection_link, read_collection).await?
            }
        };
        info!(collection = %collection.link(), ?resolution, "Collection ready");

        if collection.partition_key != request.partition_key {
            warn!(
                requested = ?request.partition_key.paths,
                actual = ?collection.partition_key.paths,
                "Collection uses a different partition key; keeping the collection's"
            );
        }

        let throughput = self.apply_throughput(&collection, request.throughput).await?;
        Ok(Provisioned {
            collection,
            throughput,
        })
    }

    async fn apply_throughput(
        &self,
        collection: &Collection,
        requested: Option<u32>,
    ) -> Result<ThroughputAllocation, ProvisionError> {
        let offer = self
            .control
            .query_offer_for_resource(&collection.rid)
            .await
            .map_err(|source| ProvisionError::ControlPlane {
                resource: format!("offer of {}", collection.link()),
                source,
            })?
            .ok_or_else(|| ProvisionError::OfferNotFound {
                collection: collection.link(),
                resource_id: collection.rid.clone(),
            })?;

        let Some(throughput) = requested else {
            info!(throughput = offer.throughput, "Using current collection throughput");
            return Ok(ThroughputAllocation(offer.throughput));
        };

        info!(from = offer.throughput, to = throughput, "Modifying collection throughput");
        let replaced = self
            .control
            .replace_offer(&offer, throughput)
            .await
            .map_err(|source| ProvisionError::ControlPlane {
                resource: format!("offer {}", offer.id),
                source,
            })?;
        Ok(ThroughputAllocation(replaced.throughput))
    }

    async fn read_existing<T, R, RFut>(
        &self,
        resource: &str,
        read: R,
    ) -> Result<(T, Resolution), ProvisionError>
    where
        R: Fn() -> RFut,
        RFut: Future<Output = Result<T, ControlPlaneError>>,
    {
        match read().await {
            Ok(found) => Ok((found, Resolution::Existing)),
            Err(err) if err.is_not_found() => Err(ProvisionError::Missing(resource.to_string())),
            Err(source) => Err(ProvisionError::ControlPlane {
                resource: resource.to_string(),
                source,
            }),
        }
    }

    async fn resolve<T, U, R, RFut, C, CFut>(
        &self,
        resource: &str,
        read: R,
        create: C,
    ) -> Result<(T, Resolution), ProvisionError>
    where
        R: Fn() -> RFut,
        RFut: Future<Output = Result<T, ControlPlaneError>>,
        C: FnOnce() -> CFut,
        CFut: Future<Output = Result<U, ControlPlaneError>>,
    {
        match read().await {
            Ok(found) => return Ok((found, Resolution::Existing)),
            Err(err) if err.is_not_found() => {}
            Err(source) => {
                return Err(ProvisionError::ControlPlane {
                    resource: resource.to_string(),
                    source,
                });
            }
        }

        info!(resource, "Attempting to create since non-existent");
        let resolution = match create().await {
            Ok(_) => Resolution::Created,
            Err(err) if err.is_conflict() => {
                info!(resource, "Created concurrently by another caller");
                Resolution::CreatedConcurrently
            }
            Err(source) => {
                return Err(ProvisionError::ControlPlane {
                    resource: resource.to_string(),
                    source,
                });
            }
        };

        let found = self
            .reread
            .run(&read, |err: &ControlPlaneError| {
                if err.is_not_found() {
                    RetryDisposition::Retry
                } else {
                    RetryDisposition::Stop
                }
            })
            .await
            .map_err(|err| match err {
                RetryError::Fatal(source) => ProvisionError::ControlPlane {
                    resource: resource.to_string(),
                    source,
                },
                RetryError::AttemptsExceeded { attempts, .. } => {
                    ProvisionError::NotVisibleAfterCreate {
                        resource: resource.to_string(),
                        attempts,
                    }
                }
            })?;

        Ok((found, resolution))
    }
}
