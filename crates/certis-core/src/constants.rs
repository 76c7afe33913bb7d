//! Shared constants for the storage core.

use std::time::Duration;

/// Bucket (and base path) used by the dev-mode disk provider when nothing
/// else is configured.
pub const DEFAULT_DEV_STORAGE_BUCKET: &str = "file_uploads";

/// Region applied to S3 configurations that leave the region blank.
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Bucket recorded for objects stored through the database provider.
pub const DEFAULT_DATABASE_BUCKET: &str = "default";

/// How long a pooled provider client stays usable before it must be rebuilt.
pub const DEFAULT_CLIENT_POOL_TTL: Duration = Duration::from_secs(15 * 60);

/// Lifetime of presigned download URLs when the caller does not pick one.
pub const DEFAULT_PRESIGNED_URL_DURATION: Duration = Duration::from_secs(10 * 60);

/// Ceiling on single-object downloads served out of the database provider.
pub const DEFAULT_DATABASE_DOWNLOAD_LIMIT: u64 = 32 * 1024 * 1024;

/// Metadata key carrying the RFC-3339 time an integration was synchronized.
pub const SYNCHRONIZED_AT_KEY: &str = "synchronized_at";
