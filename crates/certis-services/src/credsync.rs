//! Credential synchronization: config file -> system-owned records.
//!
//! Runs at startup (and may be re-invoked on a timer). For each enabled
//! provider the service fingerprints the config credentials; when no
//! existing system integration carries the same fingerprint it creates a new
//! hush + integration pair. Rotation is additive, never destructive: old
//! records stay so in-flight clients keep working until their pool TTL runs
//! out.

use certis_core::models::CredentialSet;
use certis_core::{AppError, AuthContext, ProviderSettings, ProviderType, Providers};
use certis_db::{IntegrationStore, NewSystemIntegration, SystemIntegration};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Providers the sync covers; database storage carries no credentials.
const SYNCED_PROVIDERS: [ProviderType; 4] = [
    ProviderType::S3,
    ProviderType::R2,
    ProviderType::Gcs,
    ProviderType::Disk,
];

pub struct CredentialSyncService {
    store: Arc<dyn IntegrationStore>,
    providers: Providers,
    /// Serializes reconciliations process-wide.
    guard: Mutex<()>,
}

impl CredentialSyncService {
    pub fn new(store: Arc<dyn IntegrationStore>, providers: Providers) -> Self {
        CredentialSyncService {
            store,
            providers,
            guard: Mutex::new(()),
        }
    }

    /// Reconcile config credentials for every enabled provider.
    ///
    /// Providers are processed sequentially; a failure is logged and does
    /// not abort the others. The first error, if any, is returned at the
    /// end.
    #[tracing::instrument(skip(self))]
    pub async fn sync_config_credentials(&self) -> Result<(), AppError> {
        let _serialized = self.guard.lock().await;
        let auth = AuthContext::system("system-credential-sync");

        let mut first_error = None;

        for provider in SYNCED_PROVIDERS {
            let settings = self.providers.settings(provider).clone();
            if !settings.enabled {
                continue;
            }

            if let Err(err) = self.sync_provider(&auth, provider, &settings).await {
                tracing::error!(provider = %provider, error = %err, "credential sync failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn sync_provider(
        &self,
        auth: &AuthContext,
        provider: ProviderType,
        settings: &ProviderSettings,
    ) -> Result<(), AppError> {
        let integrations = self.store.system_integrations(auth, provider).await?;

        let config_set = CredentialSet::from(&settings.credentials);
        let config_fingerprint = credential_fingerprint(&config_set);

        let mut superseded: Option<&SystemIntegration> = None;
        for integration in &integrations {
            let Some(secret) = integration.secrets.first() else {
                continue;
            };

            if credential_fingerprint(&secret.credential_set) == config_fingerprint {
                tracing::debug!(
                    provider = %provider,
                    integration_id = %integration.id,
                    "credentials already up to date"
                );
                return Ok(());
            }

            superseded.get_or_insert(integration);
        }

        let created = self
            .store
            .create_system_integration(
                auth,
                NewSystemIntegration {
                    kind: provider,
                    name: format!("System {provider} Storage"),
                    description: format!("System-level {provider} storage integration"),
                    metadata: sync_metadata(provider, settings),
                    credential_set: config_set,
                },
            )
            .await?;

        match superseded {
            Some(old) => {
                tracing::info!(
                    provider = %provider,
                    old_integration_id = %old.id,
                    new_integration_id = %created.id,
                    "rotated system credentials"
                );
            }
            None => {
                tracing::info!(
                    provider = %provider,
                    integration_id = %created.id,
                    "created system integration for config credentials"
                );
            }
        }

        Ok(())
    }

    /// The newest system integration for a provider by `synchronized_at`.
    pub async fn newest_system_integration(
        &self,
        provider: ProviderType,
    ) -> Result<SystemIntegration, AppError> {
        let auth = AuthContext::system("system-credential-sync");
        let integrations = self.store.system_integrations(&auth, provider).await?;

        integrations
            .into_iter()
            .filter(|integration| integration.synchronized_at().is_some())
            .max_by_key(|integration| integration.synchronized_at())
            .ok_or_else(|| {
                AppError::NotFound(format!("no active system integration for {provider}"))
            })
    }
}

/// Deterministic digest of a credential set.
///
/// A content fingerprint, not authentication: equality is all that matters,
/// so canonical JSON of the fixed-order struct hashed with SHA-256 is
/// enough.
pub fn credential_fingerprint(set: &CredentialSet) -> String {
    let data = serde_json::to_vec(set).unwrap_or_default();
    hex::encode(Sha256::digest(&data))
}

fn sync_metadata(
    provider: ProviderType,
    settings: &ProviderSettings,
) -> HashMap<String, serde_json::Value> {
    let mut metadata = HashMap::new();

    metadata.insert(
        "region".to_string(),
        settings.region.clone().unwrap_or_default().into(),
    );
    metadata.insert(
        "bucket".to_string(),
        settings.bucket.clone().unwrap_or_default().into(),
    );
    metadata.insert("source".to_string(), "system_config".into());
    metadata.insert(
        "synchronized_at".to_string(),
        Utc::now().to_rfc3339().into(),
    );

    if let Some(ref endpoint) = settings.endpoint {
        metadata.insert("endpoint".to_string(), endpoint.clone().into());
    }

    if provider == ProviderType::Disk {
        metadata.insert(
            "base_path".to_string(),
            settings.bucket.clone().unwrap_or_default().into(),
        );
        if let Some(ref endpoint) = settings.endpoint {
            metadata.insert("local_url".to_string(), endpoint.clone().into());
        }
    }

    metadata
}
