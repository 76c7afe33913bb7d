//! System-owned provider lookup and config fallback.
//!
//! Rules resolve credentials in two steps: prefer the newest system-owned
//! integration in the database (written by credential sync), otherwise fall
//! back to the static provider configuration.

use certis_core::constants::{DEFAULT_DEV_STORAGE_BUCKET, DEFAULT_S3_REGION};
use certis_core::models::{ProviderCredentials, ProviderHints};
use certis_core::{AppError, AuthContext, ProviderType, StorageConfig};
use certis_db::{IntegrationStore, SystemIntegration};
use certis_storage::ProviderOptions;
use std::sync::Arc;

/// Lookup outcomes that mean "fall back to config", not "fail the request".
#[derive(Debug, thiserror::Error)]
pub enum SystemLookupError {
    #[error("no system integration for provider {0}")]
    NoSystemIntegration(ProviderType),

    #[error("no system integration with secrets for provider {0}")]
    NoIntegrationWithSecrets(ProviderType),

    #[error(transparent)]
    Store(#[from] AppError),
}

/// Resolved credentials plus options for one provider.
#[derive(Debug, Clone)]
pub struct ResolvedProvider {
    pub credentials: ProviderCredentials,
    pub options: ProviderOptions,
    /// Integration and secret the credentials came from, when system-owned.
    pub integration_id: String,
    pub hush_id: String,
}

/// Fetch the newest system-owned provider configuration.
///
/// Candidates without secrets are skipped. Among the rest the winner is the
/// one whose `synchronized_at` metadata parses as the latest RFC-3339
/// instant; candidates with unparseable timestamps lose to any that parse,
/// and if none parse the first iterated candidate with secrets wins.
pub async fn query_system_provider(
    store: &Arc<dyn IntegrationStore>,
    provider: ProviderType,
) -> Result<ResolvedProvider, SystemLookupError> {
    let auth = AuthContext::system("system-storage-resolver");

    let integrations = store.system_integrations(&auth, provider).await?;
    if integrations.is_empty() {
        return Err(SystemLookupError::NoSystemIntegration(provider));
    }

    let active = pick_active(&integrations)
        .ok_or(SystemLookupError::NoIntegrationWithSecrets(provider))?;

    let secret = &active.secrets[0];
    let credentials = ProviderCredentials::from(&secret.credential_set);

    let mut options = ProviderOptions::new().with_credentials(credentials.clone());

    for (key, value) in &active.metadata {
        let as_string = match value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        };

        match (key.to_lowercase().as_str(), as_string) {
            ("bucket", Some(v)) => options.bucket = v,
            ("region", Some(v)) => options.region = v,
            ("endpoint", Some(v)) => options.endpoint = v,
            ("base_path", Some(v)) => options.base_path = v,
            ("local_url", Some(v)) => options.local_url = v,
            _ => {
                options.extra.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(ResolvedProvider {
        credentials,
        options,
        integration_id: active.id.clone(),
        hush_id: secret.id.clone(),
    })
}

fn pick_active(integrations: &[SystemIntegration]) -> Option<&SystemIntegration> {
    let mut active: Option<&SystemIntegration> = None;

    for candidate in integrations {
        if candidate.secrets.is_empty() {
            continue;
        }

        let Some(current) = active else {
            active = Some(candidate);
            continue;
        };

        match (candidate.synchronized_at(), current.synchronized_at()) {
            (Some(candidate_time), Some(best_time)) if candidate_time > best_time => {
                active = Some(candidate);
            }
            (Some(_), None) => active = Some(candidate),
            _ => {}
        }
    }

    active
}

/// Build credentials and options for a provider from static configuration.
pub fn resolve_provider_from_config(
    provider: ProviderType,
    config: &StorageConfig,
) -> Result<ResolvedProvider, AppError> {
    if provider == ProviderType::Gcs {
        return Err(AppError::UnsupportedProvider(provider.to_string()));
    }

    let settings = config.providers.settings(provider);
    if !settings.enabled {
        return Err(AppError::ProviderDisabled(provider.to_string()));
    }

    let mut options = ProviderOptions::new().with_credentials(settings.credentials.clone());

    match provider {
        ProviderType::S3 => {
            if let Some(ref bucket) = settings.bucket {
                options.bucket = bucket.clone();
            }
            options.region = settings
                .region
                .clone()
                .unwrap_or_else(|| DEFAULT_S3_REGION.to_string());
            if let Some(ref endpoint) = settings.endpoint {
                options.endpoint = endpoint.clone();
            }
        }
        ProviderType::R2 => {
            if let Some(ref bucket) = settings.bucket {
                options.bucket = bucket.clone();
            }
            if let Some(ref endpoint) = settings.endpoint {
                options.endpoint = endpoint.clone();
            }
        }
        ProviderType::Disk => {
            let bucket = settings
                .bucket
                .clone()
                .unwrap_or_else(|| DEFAULT_DEV_STORAGE_BUCKET.to_string());
            options.base_path = bucket.clone();
            options.bucket = bucket;
            if let Some(ref endpoint) = settings.endpoint {
                options.local_url = endpoint.clone();
            }
        }
        ProviderType::Database => {
            if let Some(ref bucket) = settings.bucket {
                options.bucket = bucket.clone();
            }
        }
        ProviderType::Gcs => unreachable!("rejected above"),
    }

    Ok(ResolvedProvider {
        credentials: settings.credentials.clone(),
        options,
        integration_id: String::new(),
        hush_id: String::new(),
    })
}

/// Cache-key scoping fields from hints, when the caller pinned a specific
/// integration or secret.
pub fn hint_scope(hints: Option<&ProviderHints>) -> (String, String) {
    match hints {
        Some(hints) => (hints.integration_id.clone(), hints.hush_id.clone()),
        None => (String::new(), String::new()),
    }
}
