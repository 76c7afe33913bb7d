//! The resolver rules that pick a provider for a request.

use crate::hints::{KnownProviderHint, ModuleHint, PreferredProviderHint};
use crate::system_provider::{
    query_system_provider, resolve_provider_from_config, SystemLookupError,
};
use crate::{ProviderBuilder, ProviderResolution};
use async_trait::async_trait;
use certis_core::constants::DEFAULT_DEV_STORAGE_BUCKET;
use certis_core::models::ProviderCredentials;
use certis_core::{OrgModule, ProviderType, StorageConfig};
use certis_db::IntegrationStore;
use certis_resolve::{Resolution, ResolutionRule, ResolveContext};
use certis_storage::{ProviderOptions, SharedProvider};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared state the rules consult: configuration, the registered builders,
/// and the optional integration store for system-owned credentials.
pub struct RuleEnvironment {
    config: StorageConfig,
    integrations: Option<Arc<dyn IntegrationStore>>,
    builders: HashMap<ProviderType, Arc<ProviderBuilder>>,
}

impl RuleEnvironment {
    pub fn new(
        config: StorageConfig,
        integrations: Option<Arc<dyn IntegrationStore>>,
        builders: HashMap<ProviderType, Arc<ProviderBuilder>>,
    ) -> Self {
        RuleEnvironment {
            config,
            integrations,
            builders,
        }
    }

    /// A provider is usable when its config block is enabled and a builder
    /// is registered for it.
    pub fn provider_enabled(&self, provider: ProviderType) -> bool {
        if !self.builders.contains_key(&provider) {
            return false;
        }

        match provider {
            ProviderType::S3 => self.config.providers.s3.enabled,
            ProviderType::R2 => self.config.providers.cloudflare_r2.enabled,
            ProviderType::Disk => self.config.providers.disk.enabled,
            ProviderType::Database => self.config.providers.database.enabled,
            ProviderType::Gcs => false,
        }
    }

    pub fn builder(&self, provider: ProviderType) -> Option<Arc<ProviderBuilder>> {
        self.builders.get(&provider).cloned()
    }

    /// Credentials precedence: system-owned integration first (when
    /// credential sync is on and a store is wired), then static config.
    pub async fn resolve(&self, provider: ProviderType) -> Option<ProviderResolution> {
        let builder = self.builder(provider)?;

        if self.config.credential_sync.enabled {
            if let Some(ref store) = self.integrations {
                match query_system_provider(store, provider).await {
                    Ok(resolved) => {
                        return Some(Resolution {
                            builder,
                            credentials: resolved.credentials,
                            config: resolved.options,
                        });
                    }
                    Err(
                        SystemLookupError::NoSystemIntegration(_)
                        | SystemLookupError::NoIntegrationWithSecrets(_),
                    ) => {}
                    Err(err) => {
                        tracing::warn!(
                            error = %err,
                            provider = %provider,
                            "system provider lookup failed, falling back to config"
                        );
                    }
                }
            }
        }

        match resolve_provider_from_config(provider, &self.config) {
            Ok(resolved) => Some(Resolution {
                builder,
                credentials: resolved.credentials,
                config: resolved.options,
            }),
            Err(err) => {
                tracing::warn!(error = %err, provider = %provider, "config provider resolution failed");
                None
            }
        }
    }
}

/// Dev mode: everything goes to the local dev bucket, no other rule runs.
pub struct DevModeRule {
    builder: Arc<ProviderBuilder>,
}

impl DevModeRule {
    pub fn new(builder: Arc<ProviderBuilder>) -> Self {
        DevModeRule { builder }
    }
}

#[async_trait]
impl ResolutionRule<SharedProvider, ProviderCredentials, ProviderOptions> for DevModeRule {
    async fn evaluate(&self, _ctx: &ResolveContext) -> Option<ProviderResolution> {
        let options = ProviderOptions::new()
            .with_bucket(DEFAULT_DEV_STORAGE_BUCKET)
            .with_base_path(DEFAULT_DEV_STORAGE_BUCKET)
            .with_extra("dev_mode", true);

        Some(Resolution {
            builder: Arc::clone(&self.builder),
            credentials: ProviderCredentials::default(),
            config: options,
        })
    }
}

/// Matches when the caller already knows where the object lives.
pub struct KnownProviderRule {
    env: Arc<RuleEnvironment>,
}

impl KnownProviderRule {
    pub fn new(env: Arc<RuleEnvironment>) -> Self {
        KnownProviderRule { env }
    }
}

#[async_trait]
impl ResolutionRule<SharedProvider, ProviderCredentials, ProviderOptions> for KnownProviderRule {
    async fn evaluate(&self, ctx: &ResolveContext) -> Option<ProviderResolution> {
        let KnownProviderHint(provider) = *ctx.get::<KnownProviderHint>()?;
        if !self.env.provider_enabled(provider) {
            return None;
        }

        self.env.resolve(provider).await
    }
}

/// Routes one compliance module to a fixed provider.
pub struct ModuleRule {
    env: Arc<RuleEnvironment>,
    module: OrgModule,
    provider: ProviderType,
}

impl ModuleRule {
    pub fn new(env: Arc<RuleEnvironment>, module: OrgModule, provider: ProviderType) -> Self {
        ModuleRule {
            env,
            module,
            provider,
        }
    }
}

#[async_trait]
impl ResolutionRule<SharedProvider, ProviderCredentials, ProviderOptions> for ModuleRule {
    async fn evaluate(&self, ctx: &ResolveContext) -> Option<ProviderResolution> {
        let ModuleHint(module) = *ctx.get::<ModuleHint>()?;
        if module != self.module {
            return None;
        }

        self.env.resolve(self.provider).await
    }
}

/// Honors an explicit provider preference when that provider is enabled.
pub struct PreferredProviderRule {
    env: Arc<RuleEnvironment>,
}

impl PreferredProviderRule {
    pub fn new(env: Arc<RuleEnvironment>) -> Self {
        PreferredProviderRule { env }
    }
}

#[async_trait]
impl ResolutionRule<SharedProvider, ProviderCredentials, ProviderOptions>
    for PreferredProviderRule
{
    async fn evaluate(&self, ctx: &ResolveContext) -> Option<ProviderResolution> {
        let PreferredProviderHint(provider) = *ctx.get::<PreferredProviderHint>()?;
        if !self.env.provider_enabled(provider) {
            return None;
        }

        self.env.resolve(provider).await
    }
}

/// Always matches; bound to the first enabled provider at registration time.
pub struct FallbackRule {
    env: Arc<RuleEnvironment>,
    provider: ProviderType,
}

impl FallbackRule {
    pub fn new(env: Arc<RuleEnvironment>, provider: ProviderType) -> Self {
        FallbackRule { env, provider }
    }
}

#[async_trait]
impl ResolutionRule<SharedProvider, ProviderCredentials, ProviderOptions> for FallbackRule {
    async fn evaluate(&self, _ctx: &ResolveContext) -> Option<ProviderResolution> {
        self.env.resolve(self.provider).await
    }
}
