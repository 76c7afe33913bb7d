//! In-memory store implementations.
//!
//! Back dev mode and the test suites; mirror the Postgres repositories'
//! semantics, including the system-admin gate on integration writes.

use crate::models::{FileRecord, Hush, NewFileRecord, NewSystemIntegration, SystemIntegration};
use crate::stores::{FileStore, IntegrationStore};
use async_trait::async_trait;
use bytes::Bytes;
use certis_core::{AppError, AuthContext, ProviderType};
use certis_storage::providers::{BlobStore, StoredBlob};
use certis_storage::{StorageError, StorageResult};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use ulid::Ulid;

#[derive(Default)]
pub struct MemoryIntegrationStore {
    integrations: RwLock<Vec<SystemIntegration>>,
}

impl MemoryIntegrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an integration directly, for tests.
    pub fn insert(&self, integration: SystemIntegration) {
        self.integrations
            .write()
            .expect("integration store lock poisoned")
            .push(integration);
    }

    pub fn count(&self, kind: ProviderType) -> usize {
        self.integrations
            .read()
            .expect("integration store lock poisoned")
            .iter()
            .filter(|integ| integ.kind == kind.as_str())
            .count()
    }
}

#[async_trait]
impl IntegrationStore for MemoryIntegrationStore {
    async fn system_integrations(
        &self,
        _auth: &AuthContext,
        kind: ProviderType,
    ) -> Result<Vec<SystemIntegration>, AppError> {
        let integrations = self
            .integrations
            .read()
            .expect("integration store lock poisoned");

        Ok(integrations
            .iter()
            .filter(|integ| integ.system_owned && integ.kind == kind.as_str())
            .cloned()
            .map(|mut integ| {
                integ.secrets.retain(|secret| secret.system_owned);
                integ
            })
            .collect())
    }

    async fn create_system_integration(
        &self,
        auth: &AuthContext,
        input: NewSystemIntegration,
    ) -> Result<SystemIntegration, AppError> {
        if !auth.system_admin {
            return Err(AppError::Unauthorized(
                "system integrations are system-admin only".to_string(),
            ));
        }

        let hush = Hush {
            id: Ulid::new().to_string(),
            name: format!("{}_system_credentials", input.kind),
            kind: input.kind.as_str().to_string(),
            system_owned: true,
            credential_set: input.credential_set,
        };

        let integration = SystemIntegration {
            id: Ulid::new().to_string(),
            name: input.name,
            kind: input.kind.as_str().to_string(),
            system_owned: true,
            metadata: input.metadata,
            secrets: vec![hush],
        };

        self.insert(integration.clone());
        Ok(integration)
    }
}

#[derive(Default)]
pub struct MemoryFileStore {
    records: RwLock<HashMap<String, FileRecord>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, for tests.
    pub fn insert(&self, record: FileRecord) {
        self.records
            .write()
            .expect("file store lock poisoned")
            .insert(record.id.clone(), record);
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn get(&self, id: &str) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .records
            .read()
            .expect("file store lock poisoned")
            .get(id)
            .cloned())
    }

    async fn create(&self, input: NewFileRecord) -> Result<FileRecord, AppError> {
        let record = FileRecord {
            id: Ulid::new().to_string(),
            provided_file_name: input.provided_file_name,
            detected_content_type: input.detected_content_type,
            organization_id: input.organization_id,
            created_at: Some(Utc::now()),
            ..Default::default()
        };

        self.insert(record.clone());
        Ok(record)
    }

    async fn update_storage_metadata(
        &self,
        id: &str,
        provider: ProviderType,
        bucket: &str,
        key: &str,
        size: i64,
        content_type: &str,
    ) -> Result<(), AppError> {
        let mut records = self.records.write().expect("file store lock poisoned");

        let record = records
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("file record {id}")))?;

        record.storage_provider = provider.as_str().to_string();
        record.storage_volume = bucket.to_string();
        record.storage_path = key.to_string();
        record.size = size;
        if !content_type.is_empty() {
            record.detected_content_type = content_type.to_string();
        }

        Ok(())
    }
}

/// Blob store holding object bytes in a map.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<(String, String), StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        name: &str,
    ) -> StorageResult<()> {
        let size = data.len() as i64;

        self.blobs
            .write()
            .map_err(|_| StorageError::BackendError("blob store lock poisoned".to_string()))?
            .insert(
                (bucket.to_string(), key.to_string()),
                StoredBlob {
                    data,
                    size,
                    content_type: content_type.to_string(),
                    name: name.to_string(),
                },
            );

        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Option<StoredBlob>> {
        Ok(self
            .blobs
            .read()
            .map_err(|_| StorageError::BackendError("blob store lock poisoned".to_string()))?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.blobs
            .write()
            .map_err(|_| StorageError::BackendError("blob store lock poisoned".to_string()))?
            .remove(&(bucket.to_string(), key.to_string()));

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        Ok(self
            .blobs
            .read()
            .map_err(|_| StorageError::BackendError("blob store lock poisoned".to_string()))?
            .contains_key(&(bucket.to_string(), key.to_string())))
    }
}
