//! Cache keys for pooled clients.

use certis_core::ProviderType;
use std::fmt;

/// Identifies one pooled client.
///
/// Two clients with identical keys are the same client. `tenant_id` must be
/// the caller's resolved organization ID; `integration_type` the resolved
/// provider type. The integration and hush IDs are set when a client is
/// bound to a specific system integration so credential rotation lands on a
/// fresh key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientCacheKey {
    pub tenant_id: String,
    pub integration_type: ProviderType,
    pub integration_id: String,
    pub hush_id: String,
}

impl ClientCacheKey {
    pub fn new(tenant_id: impl Into<String>, integration_type: ProviderType) -> Self {
        ClientCacheKey {
            tenant_id: tenant_id.into(),
            integration_type,
            integration_id: String::new(),
            hush_id: String::new(),
        }
    }
}

impl fmt::Display for ClientCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.tenant_id, self.integration_type, self.integration_id, self.hush_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_string_includes_all_segments() {
        let mut key = ClientCacheKey::new("org-1", ProviderType::S3);
        assert_eq!(key.to_string(), "org-1:s3::");

        key.integration_id = "integ-9".to_string();
        key.hush_id = "hush-3".to_string();
        assert_eq!(key.to_string(), "org-1:s3:integ-9:hush-3");
    }

    #[test]
    fn test_equal_keys_render_equal_strings() {
        let a = ClientCacheKey::new("org-1", ProviderType::R2);
        let b = ClientCacheKey::new("org-1", ProviderType::R2);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }
}
