//! Storage abstraction trait
//!
//! This module defines the provider contract every storage backend must
//! implement, and the error type shared across backends.

use crate::types::{
    DeleteFileOptions, DownloadFileOptions, DownloadedFileMetadata, ObjectReader,
    PresignedUrlOptions, UploadFileOptions, UploadedFileMetadata,
};
use async_trait::async_trait;
use certis_core::models::File;
use certis_core::ProviderType;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File size {size} exceeds limit of {limit} bytes")]
    SizeLimitExceeded { size: u64, limit: u64 },

    #[error("Presigned URLs not supported by the {0} provider")]
    PresignUnsupported(ProviderType),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage provider contract
///
/// All backends (disk, S3, R2, database) implement this trait so the
/// orchestration core can dispatch without coupling to backend details.
/// Implementations are safe for concurrent use; `close` must not run while
/// other operations are in flight.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Store the reader's content and return the canonical key used, which
    /// may differ from `opts.file_name`.
    async fn upload(
        &self,
        reader: ObjectReader,
        opts: &UploadFileOptions,
    ) -> StorageResult<UploadedFileMetadata>;

    /// Fetch the object's bytes. A missing object fails with
    /// [`StorageError::NotFound`]; a backend that bounds download size fails
    /// with [`StorageError::SizeLimitExceeded`] rather than truncating.
    async fn download(
        &self,
        file: &File,
        opts: &DownloadFileOptions,
    ) -> StorageResult<DownloadedFileMetadata>;

    /// Remove the object. Deleting a missing object is not an error.
    async fn delete(&self, file: &File, opts: &DeleteFileOptions) -> StorageResult<()>;

    async fn exists(&self, file: &File) -> StorageResult<bool>;

    /// A URL granting bounded read access to the object. Backends without
    /// native presign fail with [`StorageError::PresignUnsupported`].
    async fn presigned_url(
        &self,
        file: &File,
        opts: &PresignedUrlOptions,
    ) -> StorageResult<String>;

    /// Buckets visible to this provider; used only by startup validation.
    async fn list_buckets(&self) -> StorageResult<Vec<String>>;

    fn provider_type(&self) -> ProviderType;

    /// URI scheme for this backend, informational only.
    fn scheme(&self) -> &'static str;

    /// Release backend resources. Only called at shutdown or after a pool
    /// sweep; best-effort.
    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
