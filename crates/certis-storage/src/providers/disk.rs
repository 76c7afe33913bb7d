//! Local filesystem storage provider.

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
use certis_core::models::{File, ProviderCredentials};
use certis_core::ProviderType;
use certis_resolve::ClientBuilder;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncReadExt;

/// Disk provider: one directory acts as the bucket.
pub struct DiskProvider {
    bucket: String,
    base_dir: PathBuf,
    local_url: String,
}

impl DiskProvider {
    /// Creates the backing directory if it does not exist yet.
    pub async fn new(options: &ProviderOptions) -> StorageResult<Self> {
        if options.bucket.is_empty() {
            return Err(StorageError::ConfigError(
                "disk provider requires a bucket directory".to_string(),
            ));
        }

        let base_dir = if options.base_path.is_empty() {
            PathBuf::from(&options.bucket)
        } else {
            PathBuf::from(&options.base_path)
        };

        if fs::metadata(&base_dir).await.is_err() {
            tracing::info!(folder = %base_dir.display(), "storage directory does not exist, creating");
            fs::create_dir_all(&base_dir).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "failed to create storage directory {}: {}",
                    base_dir.display(),
                    e
                ))
            })?;
        }

        Ok(DiskProvider {
            bucket: options.bucket.clone(),
            base_dir,
            local_url: options.local_url.clone(),
        })
    }

    /// Converts a storage key to a path under the base directory, rejecting
    /// traversal attempts.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.base_dir.join(key))
    }
}

#[async_trait]
impl StorageProvider for DiskProvider {
    async fn upload(
        &self,
        mut reader: ObjectReader,
        opts: &UploadFileOptions,
    ) -> StorageResult<UploadedFileMetadata> {
        let key = object_key(&opts.folder_destination, &opts.file_name);
        let path = self.key_to_path(&key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await?;
        let size = buffer.len() as i64;

        fs::write(&path, &buffer).await?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            "disk upload successful"
        );

        Ok(UploadedFileMetadata {
            key,
            size,
            content_type: opts.content_type.clone(),
            bucket: self.bucket.clone(),
            provider_type: Some(ProviderType::Disk),
        })
    }

    async fn download(
        &self,
        file: &File,
        _opts: &DownloadFileOptions,
    ) -> StorageResult<DownloadedFileMetadata> {
        let path = self.key_to_path(&file.metadata.key)?;

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(file.metadata.key.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let size = data.len() as i64;

        Ok(DownloadedFileMetadata {
            data: Bytes::from(data),
            size,
            content_type: file.metadata.content_type.clone(),
            name: file.original_name.clone(),
        })
    }

    async fn delete(&self, file: &File, _opts: &DeleteFileOptions) -> StorageResult<()> {
        let path = self.key_to_path(&file.metadata.key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, file: &File) -> StorageResult<bool> {
        let path = self.key_to_path(&file.metadata.key)?;

        match fs::metadata(&path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// A plain URL under the configured local URL. Not a security boundary:
    /// nothing is signed.
    async fn presigned_url(
        &self,
        file: &File,
        _opts: &PresignedUrlOptions,
    ) -> StorageResult<String> {
        if self.local_url.is_empty() {
            return Err(StorageError::PresignUnsupported(ProviderType::Disk));
        }

        Ok(format!(
            "{}/{}",
            self.local_url.trim_end_matches('/'),
            file.metadata.key
        ))
    }

    async fn list_buckets(&self) -> StorageResult<Vec<String>> {
        fs::metadata(&self.base_dir).await?;
        Ok(vec![self.bucket.clone()])
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Disk
    }

    fn scheme(&self) -> &'static str {
        "file://"
    }
}

/// Builds pooled disk providers.
pub struct DiskBuilder;

impl DiskBuilder {
    pub fn new() -> Self {
        DiskBuilder
    }
}

impl Default for DiskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientBuilder<SharedProvider, ProviderCredentials, ProviderOptions> for DiskBuilder {
    async fn build(
        &self,
        credentials: ProviderCredentials,
        config: ProviderOptions,
    ) -> anyhow::Result<SharedProvider> {
        let mut options = config;

        if options.bucket.is_empty() {
            options.bucket = "./storage".to_string();
        }

        // the config endpoint doubles as the serving URL for disk
        if options.local_url.is_empty() {
            if let Some(endpoint) = credentials.endpoint.clone() {
                options.local_url = endpoint;
            }
        }

        let provider = DiskProvider::new(&options).await?;
        Ok(Arc::new(provider))
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::Disk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certis_core::models::FileMetadata;

    async fn temp_provider(local_url: &str) -> (tempfile::TempDir, DiskProvider) {
        let dir = tempfile::tempdir().unwrap();
        let options = ProviderOptions::new()
            .with_bucket(dir.path().to_string_lossy())
            .with_local_url(local_url);
        let provider = DiskProvider::new(&options).await.unwrap();
        (dir, provider)
    }

    fn file_for(key: &str) -> File {
        File {
            original_name: "report.txt".to_string(),
            metadata: FileMetadata {
                key: key.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let (_dir, provider) = temp_provider("").await;

        let opts = UploadFileOptions {
            file_name: "report.txt".to_string(),
            content_type: "text/plain".to_string(),
            ..Default::default()
        };
        let uploaded = provider
            .upload(Box::pin(&b"hello, world"[..]), &opts)
            .await
            .unwrap();

        assert_eq!(uploaded.key, "report.txt");
        assert_eq!(uploaded.size, 12);
        assert_eq!(uploaded.provider_type, Some(ProviderType::Disk));

        let downloaded = provider
            .download(&file_for("report.txt"), &DownloadFileOptions::default())
            .await
            .unwrap();
        assert_eq!(&downloaded.data[..], b"hello, world");
    }

    #[tokio::test]
    async fn test_download_missing_is_not_found() {
        let (_dir, provider) = temp_provider("").await;

        let err = provider
            .download(&file_for("nothing.txt"), &DownloadFileOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, provider) = temp_provider("").await;
        let opts = UploadFileOptions {
            file_name: "gone.txt".to_string(),
            ..Default::default()
        };
        provider.upload(Box::pin(&b"x"[..]), &opts).await.unwrap();

        let file = file_for("gone.txt");
        provider.delete(&file, &DeleteFileOptions::default()).await.unwrap();
        provider.delete(&file, &DeleteFileOptions::default()).await.unwrap();

        assert!(!provider.exists(&file).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let (_dir, provider) = temp_provider("").await;

        let err = provider
            .download(&file_for("../escape.txt"), &DownloadFileOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_presign_requires_local_url() {
        let (_dir, no_url) = temp_provider("").await;
        let err = no_url
            .presigned_url(&file_for("a.txt"), &PresignedUrlOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PresignUnsupported(_)));

        let (_dir2, with_url) = temp_provider("http://localhost:17608/files/").await;
        let url = with_url
            .presigned_url(&file_for("a.txt"), &PresignedUrlOptions::default())
            .await
            .unwrap();
        assert_eq!(url, "http://localhost:17608/files/a.txt");
    }
}
