//! The operational file descriptor passed through the storage core.

use crate::storage_types::{OrgModule, ProviderType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A file moving through the storage pipeline.
///
/// Created by the upload entrypoint from the inbound multipart part; the
/// provider's upload response fills in the confirmed key, size and content
/// type; the record store assigns `id` when the row is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct File {
    /// Stable ULID, empty until the record store has assigned one.
    pub id: String,
    pub original_name: String,
    pub content_type: String,
    /// Multipart form field the file arrived under.
    pub field_name: String,
    pub metadata: FileMetadata,
}

/// Storage-level metadata for a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Canonical object key at the backend. May differ from the name the
    /// caller asked for.
    pub key: String,
    pub bucket: String,
    pub size: i64,
    pub content_type: String,
    /// The provider that actually stored the object.
    pub provider_type: Option<ProviderType>,
    pub hints: Option<ProviderHints>,
}

/// Hints biasing provider resolution.
///
/// Mutable while the caller assembles the request, treated as frozen once
/// injected into the resolution context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderHints {
    /// Provider the caller would like, honored only if enabled.
    pub preferred_provider: Option<ProviderType>,
    /// Provider the object is already known to live at (downloads, deletes).
    pub known_provider: Option<ProviderType>,
    pub module: Option<OrgModule>,
    pub organization_id: String,
    pub integration_id: String,
    pub hush_id: String,
    pub metadata: HashMap<String, String>,
}

impl ProviderHints {
    /// Module tag from the typed field, falling back to the metadata map.
    pub fn resolve_module(&self) -> Option<OrgModule> {
        if let Some(module) = self.module {
            return Some(module);
        }

        self.metadata
            .get("module")
            .and_then(|raw| raw.parse::<OrgModule>().ok())
    }
}

impl File {
    /// Backfill standard hint metadata: organization, form field, size.
    pub fn populate_hints(&mut self, org_id: &str) {
        let size = self.metadata.size;
        let field_name = self.field_name.clone();
        let hints = self.metadata.hints.get_or_insert_with(ProviderHints::default);

        if !org_id.is_empty() && hints.organization_id.is_empty() {
            hints.organization_id = org_id.to_string();
        }

        if !field_name.is_empty() {
            hints.metadata.insert("key".to_string(), field_name);
        }

        if size > 0 {
            hints
                .metadata
                .insert("size_bytes".to_string(), size.to_string());
        }

        if let Some(module) = hints.resolve_module() {
            hints.module = Some(module);
            hints
                .metadata
                .insert("module".to_string(), module.as_str().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populate_hints_backfills_org_and_size() {
        let mut file = File {
            original_name: "evidence.pdf".to_string(),
            field_name: "evidence".to_string(),
            metadata: FileMetadata {
                size: 1204,
                ..Default::default()
            },
            ..Default::default()
        };

        file.populate_hints("01JGXORG00000000000000000");

        let hints = file.metadata.hints.as_ref().unwrap();
        assert_eq!(hints.organization_id, "01JGXORG00000000000000000");
        assert_eq!(hints.metadata.get("size_bytes").unwrap(), "1204");
        assert_eq!(hints.metadata.get("key").unwrap(), "evidence");
    }

    #[test]
    fn test_populate_hints_keeps_existing_org() {
        let mut file = File::default();
        file.metadata.hints = Some(ProviderHints {
            organization_id: "original-org".to_string(),
            ..Default::default()
        });

        file.populate_hints("other-org");

        assert_eq!(
            file.metadata.hints.unwrap().organization_id,
            "original-org"
        );
    }

    #[test]
    fn test_resolve_module_prefers_typed_field() {
        let mut hints = ProviderHints::default();
        hints
            .metadata
            .insert("module".to_string(), "compliance".to_string());
        assert_eq!(hints.resolve_module(), Some(OrgModule::Compliance));

        hints.module = Some(OrgModule::TrustCenter);
        assert_eq!(hints.resolve_module(), Some(OrgModule::TrustCenter));
    }
}
