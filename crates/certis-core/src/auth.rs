//! Caller identity as seen by the storage core.
//!
//! The HTTP layer authenticates requests and stores an `AuthContext` in the
//! request extensions; the core only reads it.

use serde::{Deserialize, Serialize};

/// Identity of the authenticated caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthContext {
    /// Subject (user or service account) ULID, as a string.
    pub subject_id: String,
    /// The caller's active organization ULID.
    pub organization_id: String,
    /// All organizations the caller belongs to.
    pub organization_ids: Vec<String>,
    /// System-admin callers bypass tenant isolation for system-owned records.
    pub system_admin: bool,
}

impl AuthContext {
    /// Identity used for system-owned record access during credential sync
    /// and provider resolution. Mutations under this identity bypass tenant
    /// isolation because the records are global.
    pub fn system(subject: &str) -> Self {
        AuthContext {
            subject_id: subject.to_string(),
            organization_id: String::new(),
            organization_ids: Vec::new(),
            system_admin: true,
        }
    }

    /// Whether the caller belongs to the given organization.
    pub fn in_organization(&self, org_id: &str) -> bool {
        self.organization_id == org_id || self.organization_ids.iter().any(|o| o == org_id)
    }
}
