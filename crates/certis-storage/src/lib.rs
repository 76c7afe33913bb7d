//! Certis Storage Library
//!
//! Storage provider abstraction and backend implementations. The
//! [`StorageProvider`] trait is the single polymorphic surface the
//! orchestration core dispatches through; the `providers` module realizes it
//! for local disk, S3, Cloudflare R2, and the database blob store, each with
//! a pool-compatible builder.

pub mod detect;
pub mod limit;
pub mod options;
pub mod providers;
pub mod traits;
pub mod types;

pub use detect::detect_content_type;
pub use limit::LimitedReader;
pub use options::ProviderOptions;
pub use traits::{StorageError, StorageProvider, StorageResult};
pub use types::{
    DeleteFileOptions, DownloadFileOptions, DownloadedFileMetadata, ObjectReader,
    PresignedUrlOptions, UploadFileOptions, UploadedFileMetadata,
};

use std::sync::Arc;

/// The pooled client type: every backend erases to this.
pub type SharedProvider = Arc<dyn StorageProvider>;
