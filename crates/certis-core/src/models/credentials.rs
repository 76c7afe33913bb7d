//! Provider credential value types.

use serde::{Deserialize, Serialize};

/// Credentials for a storage provider.
///
/// Every field is optional; which fields matter depends on the backend
/// (S3 wants the key pair, R2 additionally wants the account id, disk wants
/// nothing). Value type: cloned at cache-service boundaries so later
/// mutation never reaches a cached client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
    pub project_id: Option<String>,
    pub account_id: Option<String>,
    pub api_token: Option<String>,
}

impl ProviderCredentials {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.access_key_id.is_none()
            && self.secret_access_key.is_none()
            && self.endpoint.is_none()
            && self.project_id.is_none()
            && self.account_id.is_none()
            && self.api_token.is_none()
    }
}

/// The credential payload persisted on a hush record.
///
/// Serialized shape mirrors `ProviderCredentials` exactly so a fingerprint of
/// config credentials and a fingerprint of a stored set are comparable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSet {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
    pub project_id: Option<String>,
    pub account_id: Option<String>,
    pub api_token: Option<String>,
}

impl From<&ProviderCredentials> for CredentialSet {
    fn from(creds: &ProviderCredentials) -> Self {
        CredentialSet {
            access_key_id: creds.access_key_id.clone(),
            secret_access_key: creds.secret_access_key.clone(),
            endpoint: creds.endpoint.clone(),
            project_id: creds.project_id.clone(),
            account_id: creds.account_id.clone(),
            api_token: creds.api_token.clone(),
        }
    }
}

impl From<&CredentialSet> for ProviderCredentials {
    fn from(set: &CredentialSet) -> Self {
        ProviderCredentials {
            access_key_id: set.access_key_id.clone(),
            secret_access_key: set.secret_access_key.clone(),
            endpoint: set.endpoint.clone(),
            project_id: set.project_id.clone(),
            account_id: set.account_id.clone(),
            api_token: set.api_token.clone(),
        }
    }
}
