//! Store traits consumed by the orchestration core.

use crate::models::{FileRecord, NewFileRecord, NewSystemIntegration, SystemIntegration};
use async_trait::async_trait;
use certis_core::{AppError, AuthContext, ProviderType};

/// Query and mutation surface for integrations and their secrets.
///
/// Reads return system-owned integrations with their system-owned secrets
/// attached. Mutations require a system-admin caller: the records are global,
/// so writes bypass tenant isolation on purpose and the implementations gate
/// that on `auth.system_admin`.
#[async_trait]
pub trait IntegrationStore: Send + Sync {
    async fn system_integrations(
        &self,
        auth: &AuthContext,
        kind: ProviderType,
    ) -> Result<Vec<SystemIntegration>, AppError>;

    async fn create_system_integration(
        &self,
        auth: &AuthContext,
        input: NewSystemIntegration,
    ) -> Result<SystemIntegration, AppError>;
}

/// Record store for persisted files.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<FileRecord>, AppError>;

    /// Create a record, assigning its ULID.
    async fn create(&self, input: NewFileRecord) -> Result<FileRecord, AppError>;

    /// Write back the storage coordinates confirmed by the provider.
    async fn update_storage_metadata(
        &self,
        id: &str,
        provider: ProviderType,
        bucket: &str,
        key: &str,
        size: i64,
        content_type: &str,
    ) -> Result<(), AppError>;
}
