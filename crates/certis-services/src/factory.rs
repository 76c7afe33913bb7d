//! Builds the canonical resolver chain and client service from configuration.

use crate::rules::{
    DevModeRule, FallbackRule, KnownProviderRule, ModuleRule, PreferredProviderRule,
    RuleEnvironment,
};
use crate::system_provider::resolve_provider_from_config;
use crate::{ProviderBuilder, ProviderClientService, ProviderResolver};
use certis_core::constants::DEFAULT_CLIENT_POOL_TTL;
use certis_core::{OrgModule, ProviderType, StorageConfig};
use certis_db::IntegrationStore;
use certis_resolve::{ClientBuilder, ClientPool};
use certis_storage::providers::{BlobStore, DatabaseBuilder, DiskBuilder, R2Builder, S3Builder};
use certis_storage::StorageProvider;
use std::collections::HashMap;
use std::sync::Arc;

/// Fallback provider order; registered once, first enabled wins.
const FALLBACK_ORDER: [ProviderType; 4] = [
    ProviderType::S3,
    ProviderType::R2,
    ProviderType::Disk,
    ProviderType::Database,
];

/// Module routing table, applied in declaration order.
const MODULE_ROUTES: [(OrgModule, ProviderType); 2] = [
    (OrgModule::TrustCenter, ProviderType::R2),
    (OrgModule::Compliance, ProviderType::S3),
];

/// External collaborators the resolver needs.
#[derive(Default)]
pub struct ResolverDependencies {
    /// System-owned integration lookup; absent means config-only resolution.
    pub integrations: Option<Arc<dyn IntegrationStore>>,
    /// Blob persistence for the database provider; absent disables it.
    pub blobs: Option<Arc<dyn BlobStore>>,
}

/// Construct the client service and the provider resolver for a config.
pub fn build_resolver(
    config: &StorageConfig,
    deps: ResolverDependencies,
) -> (Arc<ProviderClientService>, Arc<ProviderResolver>) {
    let pool = Arc::new(ClientPool::new(DEFAULT_CLIENT_POOL_TTL));
    let client_service = Arc::new(ProviderClientService::new(pool));

    let disk_builder: Arc<ProviderBuilder> = Arc::new(DiskBuilder::new());

    let mut builders: HashMap<ProviderType, Arc<ProviderBuilder>> = HashMap::new();
    builders.insert(ProviderType::S3, Arc::new(S3Builder::new()));
    builders.insert(ProviderType::R2, Arc::new(R2Builder::new()));
    builders.insert(ProviderType::Disk, Arc::clone(&disk_builder));
    if let Some(ref blobs) = deps.blobs {
        builders.insert(
            ProviderType::Database,
            Arc::new(DatabaseBuilder::new(Arc::clone(blobs))),
        );
    }

    let env = Arc::new(RuleEnvironment::new(
        config.clone(),
        deps.integrations,
        builders,
    ));

    let mut resolver = ProviderResolver::new();

    if config.dev_mode {
        resolver.add_rule(Box::new(DevModeRule::new(disk_builder)));
        return (client_service, Arc::new(resolver));
    }

    resolver.add_rule(Box::new(KnownProviderRule::new(Arc::clone(&env))));

    for (module, provider) in MODULE_ROUTES {
        if env.provider_enabled(provider) {
            resolver.add_rule(Box::new(ModuleRule::new(Arc::clone(&env), module, provider)));
        }
    }

    resolver.add_rule(Box::new(PreferredProviderRule::new(Arc::clone(&env))));

    for provider in FALLBACK_ORDER {
        if env.provider_enabled(provider) {
            resolver.add_rule(Box::new(FallbackRule::new(Arc::clone(&env), provider)));
            break;
        }
    }

    (client_service, Arc::new(resolver))
}

/// Probe every enabled provider's bucket visibility at startup.
///
/// Failures are logged, never fatal: a provider that cannot list its bucket
/// may still come up later, and a dead one will surface per-request errors.
pub async fn validate_providers(config: &StorageConfig, deps: &ResolverDependencies) {
    for provider in FALLBACK_ORDER {
        if !config.providers.settings(provider).enabled {
            continue;
        }

        let builder: Arc<ProviderBuilder> = match provider {
            ProviderType::S3 => Arc::new(S3Builder::new()),
            ProviderType::R2 => Arc::new(R2Builder::new()),
            ProviderType::Disk => Arc::new(DiskBuilder::new()),
            ProviderType::Database => match deps.blobs {
                Some(ref blobs) => Arc::new(DatabaseBuilder::new(Arc::clone(blobs))),
                None => continue,
            },
            ProviderType::Gcs => continue,
        };

        let resolved = match resolve_provider_from_config(provider, config) {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!(provider = %provider, error = %err, "provider validation skipped");
                continue;
            }
        };

        match builder.build(resolved.credentials, resolved.options).await {
            Ok(client) => match client.list_buckets().await {
                Ok(buckets) => {
                    tracing::info!(provider = %provider, buckets = ?buckets, "storage provider validated");
                }
                Err(err) => {
                    tracing::warn!(provider = %provider, error = %err, "storage provider bucket probe failed");
                }
            },
            Err(err) => {
                tracing::warn!(provider = %provider, error = %err, "storage provider construction failed");
            }
        }
    }
}
