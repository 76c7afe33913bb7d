//! Operation option and metadata types for the provider contract.

use bytes::Bytes;
use certis_core::models::ProviderHints;
use certis_core::ProviderType;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::AsyncRead;

/// Streaming body handed to `upload`. Consumed until EOF.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Options for a single upload.
#[derive(Debug, Clone, Default)]
pub struct UploadFileOptions {
    pub file_name: String,
    pub content_type: String,
    /// Bucket override; empty means the provider's configured bucket.
    pub bucket: String,
    /// Optional folder prefix under the bucket.
    pub folder_destination: String,
    pub hints: Option<ProviderHints>,
}

/// What a provider reports back after storing an object.
#[derive(Debug, Clone, Default)]
pub struct UploadedFileMetadata {
    /// Canonical key the object was stored under.
    pub key: String,
    pub size: i64,
    pub content_type: String,
    pub bucket: String,
    pub provider_type: Option<ProviderType>,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadFileOptions {
    /// Byte ceiling for backends that bound downloads; `None` uses the
    /// backend default.
    pub limit: Option<u64>,
}

/// A downloaded object.
#[derive(Debug, Clone, Default)]
pub struct DownloadedFileMetadata {
    pub data: Bytes,
    pub size: i64,
    pub content_type: String,
    /// Display name for the object, when the backend knows one.
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct DeleteFileOptions {}

#[derive(Debug, Clone)]
pub struct PresignedUrlOptions {
    pub duration: Duration,
}

impl Default for PresignedUrlOptions {
    fn default() -> Self {
        PresignedUrlOptions {
            duration: certis_core::constants::DEFAULT_PRESIGNED_URL_DURATION,
        }
    }
}
