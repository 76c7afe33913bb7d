//! The storage service facade.
//!
//! Every read, write, presign, and delete goes through here: the service
//! enriches a resolution context with hints, runs the rule chain, obtains a
//! pooled client, and dispatches to the provider. For the database provider
//! it synthesizes presigned URLs from signed download tokens instead of
//! asking the backend.

use crate::hints::{apply_provider_hints, OrganizationIdValue, SubjectIdValue};
use crate::object_uri::format_object_uri;
use crate::secrets::DownloadSecretCache;
use crate::tokens::{encode_wire, DownloadToken};
use crate::{ProviderClientService, ProviderResolver};
use certis_core::constants::DEFAULT_PRESIGNED_URL_DURATION;
use certis_core::models::{File, FileMetadata, ProviderHints};
use certis_core::{AppError, AuthContext, ProviderType};
use certis_resolve::{ClientCacheKey, ResolveContext};
use certis_storage::limit::map_size_limit;
use certis_storage::{
    DeleteFileOptions, DownloadFileOptions, DownloadedFileMetadata, ObjectReader,
    PresignedUrlOptions, SharedProvider, StorageError, StorageProvider, UploadFileOptions,
};
use std::sync::Arc;
use std::time::Duration;
use ulid::Ulid;

/// Construction parameters for [`StorageService`].
pub struct ServiceConfig {
    pub resolver: Arc<ProviderResolver>,
    pub clients: Arc<ProviderClientService>,
    /// When set, presigned URLs are platform-issued signed tokens redeemed
    /// through the download handler; otherwise the resolved provider's
    /// native presign is used.
    pub issue_download_tokens: bool,
    /// Global upload cap enforced by HTTP entrypoints, exposed here so they
    /// can wrap their readers.
    pub max_upload_size: Option<u64>,
}

pub struct StorageService {
    resolver: Arc<ProviderResolver>,
    clients: Arc<ProviderClientService>,
    secrets: DownloadSecretCache,
    issue_download_tokens: bool,
    max_upload_size: Option<u64>,
}

impl StorageService {
    pub fn new(config: ServiceConfig) -> Self {
        StorageService {
            resolver: config.resolver,
            clients: config.clients,
            secrets: DownloadSecretCache::new(),
            issue_download_tokens: config.issue_download_tokens,
            max_upload_size: config.max_upload_size,
        }
    }

    pub fn max_upload_size(&self) -> Option<u64> {
        self.max_upload_size
    }

    /// Secret lookup for the download handler's token verification.
    pub fn lookup_download_secret(&self, token_id: Ulid) -> Option<Vec<u8>> {
        self.secrets.lookup(token_id)
    }

    /// Upload a file through provider resolution.
    #[tracing::instrument(skip(self, auth, reader, opts), fields(operation = "storage_upload"))]
    pub async fn upload(
        &self,
        auth: &AuthContext,
        reader: ObjectReader,
        opts: &UploadFileOptions,
    ) -> Result<File, AppError> {
        if opts.file_name.is_empty() || opts.content_type.is_empty() {
            return Err(AppError::BadRequest(
                "upload requires a file name and content type".to_string(),
            ));
        }

        if auth.organization_id.is_empty() {
            return Err(AppError::NoOrganizationId);
        }

        let (provider, _) = self
            .resolve_provider(auth, opts.hints.as_ref(), true)
            .await?;

        let uploaded = provider
            .upload(reader, opts)
            .await
            .map_err(|e| storage_to_app(map_size_limit(e)))?;

        Ok(File {
            id: String::new(),
            original_name: opts.file_name.clone(),
            content_type: uploaded.content_type.clone(),
            field_name: String::new(),
            metadata: FileMetadata {
                key: uploaded.key,
                bucket: uploaded.bucket,
                size: uploaded.size,
                content_type: uploaded.content_type,
                provider_type: uploaded.provider_type,
                hints: opts.hints.clone(),
            },
        })
    }

    /// Download a file's bytes.
    ///
    /// Callers that already hold a provider (a handler that has just
    /// validated a token naming it) may pass it to skip resolution; with
    /// `None` the provider is resolved from the file's hints.
    #[tracing::instrument(skip(self, auth, provider, file, opts), fields(operation = "storage_download", file_id = %file.id))]
    pub async fn download(
        &self,
        auth: &AuthContext,
        provider: Option<SharedProvider>,
        file: &File,
        opts: &DownloadFileOptions,
    ) -> Result<DownloadedFileMetadata, AppError> {
        let provider = match provider {
            Some(provider) => provider,
            None => {
                self.resolve_provider(auth, file.metadata.hints.as_ref(), false)
                    .await?
                    .0
            }
        };

        provider.download(file, opts).await.map_err(storage_to_app)
    }

    /// Delete a file. Idempotent: deleting a missing object succeeds.
    #[tracing::instrument(skip(self, auth, file, opts), fields(operation = "storage_delete", file_id = %file.id))]
    pub async fn delete(
        &self,
        auth: &AuthContext,
        file: &File,
        opts: &DeleteFileOptions,
    ) -> Result<(), AppError> {
        let (provider, _) = self
            .resolve_provider(auth, file.metadata.hints.as_ref(), false)
            .await?;

        provider.delete(file, opts).await.map_err(storage_to_app)
    }

    #[tracing::instrument(skip(self, auth, file), fields(operation = "storage_exists", file_id = %file.id))]
    pub async fn exists(&self, auth: &AuthContext, file: &File) -> Result<bool, AppError> {
        let (provider, _) = self
            .resolve_provider(auth, file.metadata.hints.as_ref(), false)
            .await?;

        provider.exists(file).await.map_err(storage_to_app)
    }

    /// A URL granting time-bounded read access to the file.
    #[tracing::instrument(skip(self, auth, file), fields(operation = "storage_presign", file_id = %file.id))]
    pub async fn presigned_url(
        &self,
        auth: &AuthContext,
        file: &File,
        duration: Duration,
    ) -> Result<String, AppError> {
        if !self.issue_download_tokens {
            let (provider, _) = self
                .resolve_provider(auth, file.metadata.hints.as_ref(), false)
                .await?;

            let opts = PresignedUrlOptions {
                duration: effective_duration(duration),
            };
            return provider
                .presigned_url(file, &opts)
                .await
                .map_err(storage_to_app);
        }

        if file.id.is_empty() {
            return Err(AppError::MissingFileId);
        }

        // the token encodes the object location, but resolution must still
        // succeed so dead configurations fail at presign time, not redemption
        let (_, resolved_type) = self
            .resolve_provider(auth, file.metadata.hints.as_ref(), false)
            .await?;

        let duration = effective_duration(duration);

        let provider_type = file.metadata.provider_type.unwrap_or(resolved_type);
        let key = if file.metadata.key.is_empty() {
            file.id.clone()
        } else {
            file.metadata.key.clone()
        };
        let object_uri = format_object_uri(provider_type, &file.metadata.bucket, &key);

        let mut token = DownloadToken::new(object_uri, duration)
            .with_content_type(file.metadata.content_type.clone());

        if !file.original_name.is_empty() {
            token = token.with_file_name(file.original_name.clone());
        }

        if let Ok(user_id) = auth.subject_id.parse::<Ulid>() {
            token = token.with_user(user_id);
        }

        if let Ok(org_id) = auth.organization_id.parse::<Ulid>() {
            token = token.with_organization(org_id);
        }

        let (signature, secret) = token
            .sign()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        self.secrets
            .store(token.token_id, &secret, token.expires_at);

        let payload = token
            .encode_payload()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let combined = encode_wire(&signature, &payload);

        Ok(format!(
            "/v1/files/{}/download?token={}",
            urlencoding::encode(&file.id),
            urlencoding::encode(&combined)
        ))
    }

    fn build_context(&self, auth: &AuthContext, hints: Option<&ProviderHints>) -> ResolveContext {
        let mut ctx = ResolveContext::new();
        ctx.insert(OrganizationIdValue(auth.organization_id.clone()));
        ctx.insert(SubjectIdValue(auth.subject_id.clone()));

        if let Some(hints) = hints {
            ctx.insert(hints.clone());
            apply_provider_hints(&mut ctx, hints);
        }

        ctx
    }

    async fn resolve_provider(
        &self,
        auth: &AuthContext,
        hints: Option<&ProviderHints>,
        require_org: bool,
    ) -> Result<(SharedProvider, ProviderType), AppError> {
        let ctx = self.build_context(auth, hints);

        let Some(resolution) = self.resolver.resolve(&ctx).await else {
            log_resolution_failure(auth, hints);
            return Err(AppError::ProviderResolutionFailed);
        };

        let provider_type = resolution.provider_type();

        let org_id = if auth.organization_id.is_empty() {
            hints.map(|h| h.organization_id.clone()).unwrap_or_default()
        } else {
            auth.organization_id.clone()
        };

        if require_org && org_id.is_empty() {
            return Err(AppError::NoOrganizationId);
        }

        let mut key = ClientCacheKey::new(org_id, provider_type);
        if let Some(hints) = hints {
            key.integration_id = hints.integration_id.clone();
            key.hush_id = hints.hush_id.clone();
        }

        let client = self
            .clients
            .get_or_build(
                &key,
                resolution.builder.as_ref(),
                &resolution.credentials,
                &resolution.config,
            )
            .await;

        match client {
            Some(client) => Ok((client, provider_type)),
            None => {
                log_resolution_failure(auth, hints);
                Err(AppError::ProviderResolutionFailed)
            }
        }
    }
}

fn effective_duration(duration: Duration) -> Duration {
    if duration.is_zero() {
        DEFAULT_PRESIGNED_URL_DURATION
    } else {
        duration
    }
}

fn log_resolution_failure(auth: &AuthContext, hints: Option<&ProviderHints>) {
    match hints {
        Some(hints) => {
            tracing::error!(
                org_id = %auth.organization_id,
                known_provider = ?hints.known_provider,
                preferred_provider = ?hints.preferred_provider,
                module = ?hints.module,
                hint_org_id = %hints.organization_id,
                hint_integration_id = %hints.integration_id,
                hint_hush_id = %hints.hush_id,
                hint_metadata = ?hints.metadata,
                "storage provider resolution failed"
            );
        }
        None => {
            tracing::error!(
                org_id = %auth.organization_id,
                "storage provider resolution failed"
            );
        }
    }
}

fn storage_to_app(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(key) => AppError::NotFound(format!("object {key}")),
        StorageError::SizeLimitExceeded { size, limit } => {
            AppError::FileSizeExceedsLimit { size, limit }
        }
        StorageError::PresignUnsupported(provider) => AppError::BadRequest(format!(
            "presigned URLs not supported by the {provider} provider"
        )),
        StorageError::InvalidKey(key) => AppError::BadRequest(format!("invalid storage key {key}")),
        other => AppError::Storage(other.to_string()),
    }
}
