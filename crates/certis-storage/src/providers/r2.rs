//! Cloudflare R2 storage provider.
//!
//! R2 speaks the S3 dialect; the provider differs from S3 in endpoint
//! construction (account-scoped), its fixed `auto` region, and the
//! credential fields it insists on.

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

const R2_REGION: &str = "auto";

#[derive(Debug)]
pub struct R2Provider {
    backend: ObjectBackend,
}

impl R2Provider {
    pub fn new(options: &ProviderOptions) -> StorageResult<Self> {
        let creds = &options.credentials;

        let (Some(account_id), Some(key_id), Some(secret)) = (
            creds.account_id.as_ref(),
            creds.access_key_id.as_ref(),
            creds.secret_access_key.as_ref(),
        ) else {
            return Err(StorageError::ConfigError(
                "R2 provider requires account id and an access key pair".to_string(),
            ));
        };

        if options.bucket.is_empty() {
            return Err(StorageError::ConfigError(
                "R2 provider requires a bucket".to_string(),
            ));
        }

        let endpoint = if options.endpoint.is_empty() {
            format!("https://{}.r2.cloudflarestorage.com", account_id)
        } else {
            options.endpoint.clone()
        };

        let store = AmazonS3Builder::new()
            .with_region(R2_REGION)
            .with_bucket_name(options.bucket.clone())
            .with_endpoint(endpoint)
            .with_access_key_id(key_id.clone())
            .with_secret_access_key(secret.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(R2Provider {
            backend: ObjectBackend::new(store, options.bucket.clone()),
        })
    }
}

#[async_trait]
impl StorageProvider for R2Provider {
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
                "R2 upload failed"
            );
            e
        })?;

        tracing::info!(
            bucket = %self.backend.bucket(),
            key = %key,
            size_bytes = size,
            "R2 upload successful"
        );

        Ok(UploadedFileMetadata {
            key,
            size,
            content_type: opts.content_type.clone(),
            bucket: self.backend.bucket().to_string(),
            provider_type: Some(ProviderType::R2),
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
        ProviderType::R2
    }

    fn scheme(&self) -> &'static str {
        "r2://"
    }
}

/// Builds pooled R2 providers.
pub struct R2Builder;

impl R2Builder {
    pub fn new() -> Self {
        R2Builder
    }
}

impl Default for R2Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientBuilder<SharedProvider, ProviderCredentials, ProviderOptions> for R2Builder {
    async fn build(
        &self,
        credentials: ProviderCredentials,
        config: ProviderOptions,
    ) -> anyhow::Result<SharedProvider> {
        let mut options = config;
        if !credentials.is_empty() {
            options.credentials = credentials;
        }

        let provider = R2Provider::new(&options)?;
        Ok(Arc::new(provider))
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::R2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r2_credentials() -> ProviderCredentials {
        ProviderCredentials {
            account_id: Some("acct123".to_string()),
            access_key_id: Some("key".to_string()),
            secret_access_key: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_requires_account_and_key_pair() {
        let err = R2Provider::new(&ProviderOptions::new().with_bucket("beta")).unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
    }

    #[test]
    fn test_new_with_full_credentials() {
        let provider = R2Provider::new(
            &ProviderOptions::new()
                .with_bucket("beta")
                .with_credentials(r2_credentials()),
        )
        .unwrap();

        assert_eq!(provider.provider_type(), ProviderType::R2);
        assert_eq!(provider.scheme(), "r2://");
    }
}
