//! Static storage configuration.
//!
//! These structs are deserialized from the platform's config file by the
//! server bootstrap; the storage core treats them as read-only input. Field
//! names follow the config file's snake_case keys.

use crate::models::ProviderCredentials;
use serde::{Deserialize, Serialize};

/// Top-level object storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Master switch for the storage subsystem.
    pub enabled: bool,
    /// Dev mode routes everything to a local disk bucket regardless of hints.
    pub dev_mode: bool,
    pub providers: Providers,
    pub credential_sync: CredentialSyncConfig,
    /// Optional global cap applied by upload entrypoints, in bytes.
    pub max_upload_size: Option<u64>,
}

/// Per-backend configuration blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Providers {
    pub s3: ProviderSettings,
    pub cloudflare_r2: ProviderSettings,
    pub gcs: ProviderSettings,
    pub disk: ProviderSettings,
    pub database: ProviderSettings,
}

impl Providers {
    /// Settings block for a provider type, if the type has one.
    pub fn settings(&self, provider: crate::ProviderType) -> &ProviderSettings {
        match provider {
            crate::ProviderType::S3 => &self.s3,
            crate::ProviderType::R2 => &self.cloudflare_r2,
            crate::ProviderType::Gcs => &self.gcs,
            crate::ProviderType::Disk => &self.disk,
            crate::ProviderType::Database => &self.database,
        }
    }
}

/// Configuration of a single provider instantiation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub enabled: bool,
    pub region: Option<String>,
    pub bucket: Option<String>,
    /// For S3-compatible backends this is the API endpoint; for disk it is
    /// the local URL files are served from.
    pub endpoint: Option<String>,
    pub credentials: ProviderCredentials,
}

/// Controls reconciliation of config credentials into system-owned records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSyncConfig {
    pub enabled: bool,
}
