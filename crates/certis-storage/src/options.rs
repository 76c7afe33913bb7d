//! Provider instantiation options.

use certis_core::models::ProviderCredentials;
use std::collections::HashMap;

/// Configuration of one provider instantiation.
///
/// Owns no resources; `Clone` deep-copies, including the `extra` map, so a
/// clone handed to a builder is insulated from later mutation of the
/// original.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    pub bucket: String,
    /// Filesystem root for the disk provider.
    pub base_path: String,
    pub region: String,
    pub endpoint: String,
    /// URL the disk provider serves files from, used for its presign.
    pub local_url: String,
    pub credentials: ProviderCredentials,
    /// Open-ended pass-through settings (dev-mode markers, backend knobs).
    pub extra: HashMap<String, serde_json::Value>,
}

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_local_url(mut self, local_url: impl Into<String>) -> Self {
        self.local_url = local_url.into();
        self
    }

    pub fn with_credentials(mut self, credentials: ProviderCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Extra value as a string, tolerating non-string JSON scalars.
    pub fn extra_str(&self, key: &str) -> Option<String> {
        self.extra.get(key).and_then(|value| match value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
    }

    pub fn extra_u64(&self, key: &str) -> Option<u64> {
        self.extra.get(key).and_then(|value| value.as_u64())
    }
}
