//! Certis Core Library
//!
//! This crate provides the domain models, configuration, and error types that
//! are shared across all certis object-storage components.

pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use auth::AuthContext;
pub use config::{CredentialSyncConfig, ProviderSettings, Providers, StorageConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::{OrgModule, ProviderType};
