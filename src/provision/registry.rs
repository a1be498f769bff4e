use tracing::info;

use crate::config::ProvisionConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::schema::{REGISTRY_COLLECTION, REGISTRY_INDEX};
use crate::types::{CustomerRecord, TenantName};

/// Ensures the registry collection and its unique `name` index exist.
pub async fn ensure_registry<E: Engine>(engine: &E, config: &ProvisionConfig) -> Result<()> {
    engine
        .create_collection(&config.registry_db, REGISTRY_COLLECTION)
        .await?;
    engine.create_index(&config.registry_db, &REGISTRY_INDEX).await?;
    info!(registry = %config.registry_db, "Tenant registry ready");
    Ok(())
}

/// Records a tenant in the registry. There is no pre-check: the unique
/// index is the guard, and a violation is reported as `DuplicateTenant`.
pub async fn register_tenant<E: Engine>(
    engine: &E,
    config: &ProvisionConfig,
    tenant: &TenantName,
) -> Result<()> {
    let record = serde_json::to_value(CustomerRecord {
        name: tenant.to_string(),
    })?;

    match engine
        .insert_one(&config.registry_db, REGISTRY_COLLECTION, &record)
        .await
    {
        Ok(()) => {
            info!(tenant = %tenant, registry = %config.registry_db, "Registered tenant");
            Ok(())
        }
        Err(Error::DuplicateKey { .. }) => Err(Error::DuplicateTenant(tenant.to_string())),
        Err(e) => Err(e),
    }
}

/// Names of every registered tenant, in insertion order.
pub async fn list_tenants<E: Engine>(engine: &E, config: &ProvisionConfig) -> Result<Vec<String>> {
    let documents = engine
        .find_all(&config.registry_db, REGISTRY_COLLECTION)
        .await?;

    let mut tenants = Vec::with_capacity(documents.len());
    for document in documents {
        let record: CustomerRecord = serde_json::from_value(document)?;
        tenants.push(record.name);
    }
    Ok(tenants)
}
