//! Credential synchronization against the in-memory integration store.

use certis_core::models::ProviderCredentials;
use certis_core::{ProviderSettings, ProviderType, Providers};
use certis_db::MemoryIntegrationStore;
use certis_services::CredentialSyncService;
use std::sync::Arc;

fn providers_with_s3_key(key: &str) -> Providers {
    Providers {
        s3: ProviderSettings {
            enabled: true,
            region: Some("us-east-1".to_string()),
            bucket: Some("alpha".to_string()),
            credentials: ProviderCredentials {
                access_key_id: Some(key.to_string()),
                secret_access_key: Some("secret".to_string()),
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn sync_is_idempotent_for_matching_fingerprint() {
    let store = Arc::new(MemoryIntegrationStore::new());

    let sync = CredentialSyncService::new(store.clone(), providers_with_s3_key("K1"));
    sync.sync_config_credentials().await.unwrap();
    assert_eq!(store.count(ProviderType::S3), 1);

    // same config again: fingerprint matches, nothing new is written
    sync.sync_config_credentials().await.unwrap();
    assert_eq!(store.count(ProviderType::S3), 1);
}

#[tokio::test]
async fn sync_rotates_on_credential_change() {
    let store = Arc::new(MemoryIntegrationStore::new());

    let first = CredentialSyncService::new(store.clone(), providers_with_s3_key("K1"));
    first.sync_config_credentials().await.unwrap();
    assert_eq!(store.count(ProviderType::S3), 1);

    let second = CredentialSyncService::new(store.clone(), providers_with_s3_key("K2"));
    second.sync_config_credentials().await.unwrap();

    // rotation is additive: the old record stays
    assert_eq!(store.count(ProviderType::S3), 2);

    let newest = second
        .newest_system_integration(ProviderType::S3)
        .await
        .unwrap();
    assert_eq!(
        newest.secrets[0].credential_set.access_key_id.as_deref(),
        Some("K2")
    );
}

#[tokio::test]
async fn sync_skips_disabled_providers() {
    let store = Arc::new(MemoryIntegrationStore::new());

    let mut providers = providers_with_s3_key("K1");
    providers.s3.enabled = false;

    let sync = CredentialSyncService::new(store.clone(), providers);
    sync.sync_config_credentials().await.unwrap();

    assert_eq!(store.count(ProviderType::S3), 0);
}

#[tokio::test]
async fn sync_covers_multiple_enabled_providers() {
    let store = Arc::new(MemoryIntegrationStore::new());

    let mut providers = providers_with_s3_key("K1");
    providers.disk = ProviderSettings {
        enabled: true,
        bucket: Some("file_uploads".to_string()),
        endpoint: Some("http://localhost:17608/files".to_string()),
        ..Default::default()
    };

    let sync = CredentialSyncService::new(store.clone(), providers);
    sync.sync_config_credentials().await.unwrap();

    assert_eq!(store.count(ProviderType::S3), 1);
    assert_eq!(store.count(ProviderType::Disk), 1);

    let disk = sync
        .newest_system_integration(ProviderType::Disk)
        .await
        .unwrap();
    assert_eq!(disk.metadata.get("base_path").unwrap(), "file_uploads");
    assert_eq!(
        disk.metadata.get("local_url").unwrap(),
        "http://localhost:17608/files"
    );
}
