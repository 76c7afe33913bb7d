//! Shared plumbing for S3-compatible backends.
//!
//! Both the S3 and R2 providers speak the S3 dialect through `object_store`;
//! this module holds the store wiring and error mapping they have in common.

use crate::traits::{StorageError, StorageResult};
use bytes::Bytes;
use futures::StreamExt;
use http::Method;
use object_store::aws::AmazonS3;
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::{Error as ObjectStoreError, ObjectStore, PutPayload};
use std::time::Duration;

/// One bucket-scoped S3-compatible store.
#[derive(Debug)]
pub(crate) struct ObjectBackend {
    store: AmazonS3,
    bucket: String,
}

impl ObjectBackend {
    pub(crate) fn new(store: AmazonS3, bucket: String) -> Self {
        ObjectBackend { store, bucket }
    }

    pub(crate) fn bucket(&self) -> &str {
        &self.bucket
    }

    pub(crate) async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        let location = ObjectPath::from(key);

        self.store
            .put(&location, PutPayload::from(data))
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        Ok(())
    }

    pub(crate) async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let location = ObjectPath::from(key);

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))
    }

    pub(crate) async fn exists(&self, key: &str) -> StorageResult<bool> {
        let location = ObjectPath::from(key);

        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    /// Delete is idempotent: a missing object is success.
    pub(crate) async fn delete(&self, key: &str) -> StorageResult<()> {
        let location = ObjectPath::from(key);

        match self.store.delete(&location).await {
            Ok(()) => Ok(()),
            Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(e.to_string())),
        }
    }

    pub(crate) async fn signed_get_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let location = ObjectPath::from(key);

        let url = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        Ok(url.to_string())
    }

    /// Issue a cheap list to verify the bucket is reachable.
    pub(crate) async fn probe(&self) -> StorageResult<()> {
        let mut listing = self.store.list(None);

        match listing.next().await {
            Some(Err(e)) => Err(StorageError::BackendError(e.to_string())),
            _ => Ok(()),
        }
    }
}
