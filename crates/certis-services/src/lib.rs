//! Certis Services Library
//!
//! The orchestration layer over storage providers: the canonical resolver
//! rule chain, the storage service facade every caller goes through, the
//! signed download-token machinery for the database provider, and the
//! credential synchronization that reconciles config-file credentials with
//! system-owned integration records.

pub mod credsync;
pub mod factory;
pub mod hints;
pub mod object_uri;
pub mod rules;
pub mod secrets;
pub mod service;
pub mod system_provider;
pub mod tokens;

pub use credsync::CredentialSyncService;
pub use factory::{build_resolver, validate_providers, ResolverDependencies};
pub use secrets::DownloadSecretCache;
pub use service::{ServiceConfig, StorageService};
pub use tokens::DownloadToken;

use certis_core::models::ProviderCredentials;
use certis_resolve::{ClientBuilder, ClientService, Resolution, Resolver};
use certis_storage::{ProviderOptions, SharedProvider};

/// Resolution output specialized to storage providers.
pub type ProviderResolution = Resolution<SharedProvider, ProviderCredentials, ProviderOptions>;

/// Resolver specialized to storage providers.
pub type ProviderResolver = Resolver<SharedProvider, ProviderCredentials, ProviderOptions>;

/// Client service specialized to storage providers.
pub type ProviderClientService = ClientService<SharedProvider>;

/// Builder trait object specialized to storage providers.
pub type ProviderBuilder =
    dyn ClientBuilder<SharedProvider, ProviderCredentials, ProviderOptions>;
