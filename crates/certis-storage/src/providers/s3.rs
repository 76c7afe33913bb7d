//! S3 storage provider.

use super::object_key;
use super::s3compat::ObjectBackend;
use crate::options::ProviderOptions;
use crate::traits::{StorageError, StorageProvider, StorageResult};
use crate::types::{
    DeleteFileOptions, DownloadFileOptions, DownloadedFileMetadata, ObjectReader,
    PresignedUrlOptions, UploadFileOptions, UploadedFileMetadata,
};
use crate::SharedProvider;
use async_trait::async_trait;
use bytes::Bytes;
use certis_core::models::{File, ProviderCredentials};
use certis_core::ProviderType;
use certis_resolve::ClientBuilder;
use object_store::aws::AmazonS3Builder;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// S3 provider backed by `object_store`.
///
/// Works against AWS proper and S3-compatible services (MinIO, Spaces) via a
/// custom endpoint. Credentials left empty fall back to the standard AWS
/// environment sources.
#[derive(Debug)]
pub struct S3Provider {
    backend: ObjectBackend,
    region: String,
}

impl S3Provider {
    pub fn new(options: &ProviderOptions) -> StorageResult<Self> {
        if options.bucket.is_empty() {
            return Err(StorageError::ConfigError(
                "S3 provider requires a bucket".to_string(),
            ));
        }

        let region = if options.region.is_empty() {
            certis_core::constants::DEFAULT_S3_REGION.to_string()
        } else {
            options.region.clone()
        };

        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(options.bucket.clone());

        if let Some(ref key_id) = options.credentials.access_key_id {
            builder = builder.with_access_key_id(key_id.clone());
        }

        if let Some(ref secret) = options.credentials.secret_access_key {
            builder = builder.with_secret_access_key(secret.clone());
        }

        if !options.endpoint.is_empty() {
            let allow_http = options.endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(options.endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Provider {
            backend: ObjectBackend::new(store, options.bucket.clone()),
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl StorageProvider for S3Provider {
    async fn upload(
        &self,
        mut reader: ObjectReader,
        opts: &UploadFileOptions,
    ) -> StorageResult<UploadedFileMetadata> {
        let key = object_key(&opts.folder_destination, &opts.file_name);

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await?;
        let size = buffer.len() as i64;

        self.backend.put(&key, Bytes::from(buffer)).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.backend.bucket(),
                key = %key,
                size_bytes = size,
                "S3 upload failed"
            );
            e
        })?;

        tracing::info!(
            bucket = %self.backend.bucket(),
            key = %key,
            size_bytes = size,
            "S3 upload successful"
        );

        Ok(UploadedFileMetadata {
            key,
            size,
            content_type: opts.content_type.clone(),
            bucket: self.backend.bucket().to_string(),
            provider_type: Some(ProviderType::S3),
        })
    }

    async fn download(
        &self,
        file: &File,
        _opts: &DownloadFileOptions,
    ) -> StorageResult<DownloadedFileMetadata> {
        let data = self.backend.get(&file.metadata.key).await?;
        let size = data.len() as i64;

        Ok(DownloadedFileMetadata {
            data,
            size,
            content_type: file.metadata.content_type.clone(),
            name: file.original_name.clone(),
        })
    }

    async fn delete(&self, file: &File, _opts: &DeleteFileOptions) -> StorageResult<()> {
        self.backend.delete(&file.metadata.key).await
    }

    async fn exists(&self, file: &File) -> StorageResult<bool> {
        self.backend.exists(&file.metadata.key).await
    }

    async fn presigned_url(
        &self,
        file: &File,
        opts: &PresignedUrlOptions,
    ) -> StorageResult<String> {
        self.backend
            .signed_get_url(&file.metadata.key, opts.duration)
            .await
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        self.backend.probe().await?;
        Ok(vec![self.backend.bucket().to_string()])
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::S3
    }

    fn scheme(&self) -> &'static str {
        "s3://"
    }
}

/// Builds pooled S3 providers.
pub struct S3Builder;

impl S3Builder {
    pub fn new() -> Self {
        S3Builder
    }
}

impl Default for S3Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientBuilder<SharedProvider, ProviderCredentials, ProviderOptions> for S3Builder {
    async fn build(
        &self,
        credentials: ProviderCredentials,
        config: ProviderOptions,
    ) -> anyhow::Result<SharedProvider> {
        let mut options = config;
        if !credentials.is_empty() {
            options.credentials = credentials;
        }

        let provider = S3Provider::new(&options)?;
        Ok(Arc::new(provider))
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::S3
    }
}
