//! Persistence models for the storage core.

use certis_core::models::CredentialSet;
use certis_core::ProviderType;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A secret record attached to an integration.
#[derive(Debug, Clone)]
pub struct Hush {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub system_owned: bool,
    pub credential_set: CredentialSet,
}

/// An integration row describing one provider configuration.
///
/// System-owned rows belong to the platform itself and are readable by every
/// tenant's resolution path; the core only ever writes them from the
/// credential sync.
#[derive(Debug, Clone)]
pub struct SystemIntegration {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub system_owned: bool,
    pub metadata: HashMap<String, serde_json::Value>,
    pub secrets: Vec<Hush>,
}

impl SystemIntegration {
    /// The `synchronized_at` metadata value parsed as RFC-3339.
    pub fn synchronized_at(&self) -> Option<DateTime<Utc>> {
        self.metadata
            .get(certis_core::constants::SYNCHRONIZED_AT_KEY)
            .and_then(|value| value.as_str())
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
    }
}

/// Input for creating an integration with one attached secret.
#[derive(Debug, Clone)]
pub struct NewSystemIntegration {
    pub kind: ProviderType,
    pub name: String,
    pub description: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub credential_set: CredentialSet,
}

/// The persisted record for a stored file.
#[derive(Debug, Clone, Default)]
pub struct FileRecord {
    pub id: String,
    pub provided_file_name: String,
    pub detected_content_type: String,
    pub storage_provider: String,
    /// Bucket the object lives in.
    pub storage_volume: String,
    /// Object key at the backend; empty means the record's own id.
    pub storage_path: String,
    pub size: i64,
    pub organization_id: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating a file record before the object is uploaded.
#[derive(Debug, Clone, Default)]
pub struct NewFileRecord {
    pub provided_file_name: String,
    pub detected_content_type: String,
    pub organization_id: String,
}
