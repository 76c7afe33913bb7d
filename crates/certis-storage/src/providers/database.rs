//! Database-backed blob storage provider.
//!
//! Objects live in rows behind the [`BlobStore`] port; the provider itself
//! carries no SQL. There is no native presign here: the orchestration layer
//! synthesizes signed download tokens instead.

use super::object_key;
use crate::options::ProviderOptions;
use crate::traits::{StorageError, StorageProvider, StorageResult};
use crate::types::{
    DeleteFileOptions, DownloadFileOptions, DownloadedFileMetadata, ObjectReader,
    PresignedUrlOptions, UploadFileOptions, UploadedFileMetadata,
};
use crate::SharedProvider;
use async_trait::async_trait;
use bytes::Bytes;
use certis_core::constants::{DEFAULT_DATABASE_BUCKET, DEFAULT_DATABASE_DOWNLOAD_LIMIT};
use certis_core::models::{File, ProviderCredentials};
use certis_core::ProviderType;
use certis_resolve::ClientBuilder;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// A blob fetched from the store.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub data: Bytes,
    pub size: i64,
    pub content_type: String,
    pub name: String,
}

/// Persistence port for database-held objects.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        name: &str,
    ) -> StorageResult<()>;

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Option<StoredBlob>>;

    /// Must succeed when the blob is already gone.
    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()>;

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool>;
}

pub struct DatabaseProvider {
    store: Arc<dyn BlobStore>,
    bucket: String,
    download_limit: u64,
}

impl DatabaseProvider {
    pub fn new(store: Arc<dyn BlobStore>, options: &ProviderOptions) -> Self {
        let bucket = if options.bucket.is_empty() {
            DEFAULT_DATABASE_BUCKET.to_string()
        } else {
            options.bucket.clone()
        };

        let download_limit = options
            .extra_u64("max_download_bytes")
            .unwrap_or(DEFAULT_DATABASE_DOWNLOAD_LIMIT);

        DatabaseProvider {
            store,
            bucket,
            download_limit,
        }
    }

    fn bucket_for(&self, file: &File) -> String {
        if file.metadata.bucket.is_empty() {
            self.bucket.clone()
        } else {
            file.metadata.bucket.clone()
        }
    }
}

#[async_trait]
impl StorageProvider for DatabaseProvider {
    async fn upload(
        &self,
        mut reader: ObjectReader,
        opts: &UploadFileOptions,
    ) -> StorageResult<UploadedFileMetadata> {
        let key = object_key(&opts.folder_destination, &opts.file_name);
        let bucket = if opts.bucket.is_empty() {
            self.bucket.clone()
        } else {
            opts.bucket.clone()
        };

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await?;
        let size = buffer.len() as i64;

        self.store
            .put(
                &bucket,
                &key,
                Bytes::from(buffer),
                &opts.content_type,
                &opts.file_name,
            )
            .await?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            "database upload successful"
        );

        Ok(UploadedFileMetadata {
            key,
            size,
            content_type: opts.content_type.clone(),
            bucket,
            provider_type: Some(ProviderType::Database),
        })
    }

    async fn download(
        &self,
        file: &File,
        opts: &DownloadFileOptions,
    ) -> StorageResult<DownloadedFileMetadata> {
        let bucket = self.bucket_for(file);
        let limit = opts.limit.unwrap_or(self.download_limit);

        let blob = self
            .store
            .get(&bucket, &file.metadata.key)
            .await?
            .ok_or_else(|| StorageError::NotFound(file.metadata.key.clone()))?;

        if blob.size as u64 > limit {
            return Err(StorageError::SizeLimitExceeded {
                size: blob.size as u64,
                limit,
            });
        }

        Ok(DownloadedFileMetadata {
            data: blob.data,
            size: blob.size,
            content_type: blob.content_type,
            name: blob.name,
        })
    }

    async fn delete(&self, file: &File, _opts: &DeleteFileOptions) -> StorageResult<()> {
        self.store.delete(&self.bucket_for(file), &file.metadata.key).await
    }

    async fn exists(&self, file: &File) -> StorageResult<bool> {
        self.store.exists(&self.bucket_for(file), &file.metadata.key).await
    }

    async fn presigned_url(
        &self,
        _file: &File,
        _opts: &PresignedUrlOptions,
    ) -> StorageResult<String> {
        Err(StorageError::PresignUnsupported(ProviderType::Database))
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        Ok(vec![self.bucket.clone()])
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Database
    }

    fn scheme(&self) -> &'static str {
        "db://"
    }
}

/// Builds pooled database providers over a shared blob store.
pub struct DatabaseBuilder {
    store: Arc<dyn BlobStore>,
}

impl DatabaseBuilder {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        DatabaseBuilder { store }
    }
}

#[async_trait]
impl ClientBuilder<SharedProvider, ProviderCredentials, ProviderOptions> for DatabaseBuilder {
    async fn build(
        &self,
        _credentials: ProviderCredentials,
        config: ProviderOptions,
    ) -> anyhow::Result<SharedProvider> {
        Ok(Arc::new(DatabaseProvider::new(
            Arc::clone(&self.store),
            &config,
        )))
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Database
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certis_core::models::FileMetadata;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MapBlobStore {
        blobs: Mutex<HashMap<(String, String), StoredBlob>>,
    }

    #[async_trait]
    impl BlobStore for MapBlobStore {
        async fn put(
            &self,
            bucket: &str,
            key: &str,
            data: Bytes,
            content_type: &str,
            name: &str,
        ) -> StorageResult<()> {
            let size = data.len() as i64;
            self.blobs.lock().await.insert(
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
                .lock()
                .await
                .get(&(bucket.to_string(), key.to_string()))
                .cloned())
        }

        async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
            self.blobs
                .lock()
                .await
                .remove(&(bucket.to_string(), key.to_string()));
            Ok(())
        }

        async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
            Ok(self
                .blobs
                .lock()
                .await
                .contains_key(&(bucket.to_string(), key.to_string())))
        }
    }

    fn provider() -> DatabaseProvider {
        DatabaseProvider::new(Arc::new(MapBlobStore::default()), &ProviderOptions::new())
    }

    fn file_for(key: &str) -> File {
        File {
            metadata: FileMetadata {
                key: key.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upload_download_round_trip() {
        let provider = provider();
        let opts = UploadFileOptions {
            file_name: "doc.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            ..Default::default()
        };

        let uploaded = provider
            .upload(Box::pin(&b"pdf bytes here"[..]), &opts)
            .await
            .unwrap();
        assert_eq!(uploaded.bucket, DEFAULT_DATABASE_BUCKET);
        assert_eq!(uploaded.provider_type, Some(ProviderType::Database));

        let downloaded = provider
            .download(&file_for("doc.pdf"), &DownloadFileOptions::default())
            .await
            .unwrap();
        assert_eq!(&downloaded.data[..], b"pdf bytes here");
        assert_eq!(downloaded.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_download_over_limit_fails() {
        let provider = provider();
        let opts = UploadFileOptions {
            file_name: "big.bin".to_string(),
            ..Default::default()
        };
        provider
            .upload(Box::pin(&[0u8; 64][..]), &opts)
            .await
            .unwrap();

        let err = provider
            .download(
                &file_for("big.bin"),
                &DownloadFileOptions { limit: Some(16) },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::SizeLimitExceeded { .. }));
    }

    #[tokio::test]
    async fn test_presign_unsupported() {
        let err = provider()
            .presigned_url(&file_for("doc.pdf"), &PresignedUrlOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PresignUnsupported(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let provider = provider();
        provider
            .delete(&file_for("ghost"), &DeleteFileOptions::default())
            .await
            .unwrap();
    }
}
