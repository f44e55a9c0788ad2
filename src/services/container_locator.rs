//! Tenant directory lookup for private blob containers.

use crate::{
    errors::{MigrationError, MigrationResult},
    models::{attachment::ContainerId, resource_group::ResourceGroup},
};
use sqlx::SqlitePool;

/// Look up the private container id registered for `tenant_id`.
///
/// Returns `TenantContainerNotFound` when the tenant row is missing or its
/// container column is null or blank.
pub async fn tenant_container(db: &SqlitePool, tenant_id: &str) -> MigrationResult<String> {
    let container = sqlx::query_scalar::<_, Option<String>>(
        "SELECT container_id FROM tenants WHERE id = ?",
    )
    .bind(tenant_id)
    .fetch_optional(db)
    .await?
    .flatten()
    .filter(|id| !id.trim().is_empty());

    container.ok_or_else(|| MigrationError::TenantContainerNotFound(tenant_id.to_string()))
}

/// Source and destination containers for a move between two groups.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerPair {
    pub source: ContainerId,
    pub destination: ContainerId,
}

impl ContainerPair {
    pub fn resolve(source: ResourceGroup, destination: ResourceGroup, tenant_container: &str) -> Self {
        Self {
            source: ContainerId::for_group(source, tenant_container),
            destination: ContainerId::for_group(destination, tenant_container),
        }
    }

    /// When both sides share a container the objects already exist where the
    /// destination rows will point, so no blob copy is needed.
    pub fn needs_copy(&self) -> bool {
        self.source != self.destination
    }
}
