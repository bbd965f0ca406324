use crate::error::RunError;
use connectors::{
    backend::StoreBackend,
    bulk::{BulkExecutor, BulkExecutorConfig},
};
use engine_config::settings::RunSettings;
use engine_core::provision::Provisioned;
use tracing::info;

/// Executor configuration for the provisioned collection. The collection's
/// own partition key and the allocation read back from its offer win over
/// what the settings asked for.
pub fn bulk_executor_config(
    settings: &RunSettings,
    provisioned: &Provisioned,
) -> BulkExecutorConfig {
    BulkExecutorConfig {
        endpoint: settings.endpoint.clone(),
        credential: settings.credential.clone(),
        database_id: provisioned.collection.database_id.clone(),
        collection_id: provisioned.collection.id.clone(),
        partition_key: provisioned.collection.partition_key.clone(),
        throughput: provisioned.throughput,
        max_concurrency: settings.max_connection_pool_size,
    }
}

pub async fn create_bulk_executor(
    backend: &dyn StoreBackend,
    settings: &RunSettings,
    provisioned: &Provisioned,
) -> Result<Box<dyn BulkExecutor>, RunError> {
    let config = bulk_executor_config(settings, provisioned);
    info!(
        collection = %provisioned.collection.link(),
        throughput = %config.throughput,
        "Creating bulk executor"
    );
    Ok(backend.bulk_executor(config).await?)
}
