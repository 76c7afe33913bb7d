//! Error types module
//!
//! All orchestration errors are unified under the `AppError` enum, which can
//! represent resolution, authorization, storage, and database failures. The
//! `ErrorMetadata` trait lets each variant self-describe how the HTTP
//! boundary should present it.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "PROVIDER_RESOLUTION_FAILED")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Upload attempted without a resolvable tenant.
    #[error("no organization id in request context")]
    NoOrganizationId,

    /// No resolver rule matched, or the matched rule's builder failed.
    #[error("storage provider resolution failed")]
    ProviderResolutionFailed,

    /// Config-path resolution was asked for a provider the platform cannot build.
    #[error("unsupported storage provider: {0}")]
    UnsupportedProvider(String),

    /// Config-path resolution was asked for a provider that is switched off.
    #[error("storage provider disabled: {0}")]
    ProviderDisabled(String),

    /// Presign attempted on a file that has not been persisted yet.
    #[error("file id is required for presigned download URLs")]
    MissingFileId,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("file size {size} exceeds limit of {limit} bytes")]
    FileSizeExceedsLimit { size: u64, limit: u64 },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

/// Static metadata per variant: (http_status, error_code, sensitive, log_level).
fn static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::NoOrganizationId => (401, "NO_ORGANIZATION_ID", false, LogLevel::Debug),
        AppError::ProviderResolutionFailed => {
            (500, "PROVIDER_RESOLUTION_FAILED", true, LogLevel::Error)
        }
        AppError::UnsupportedProvider(_) => (400, "UNSUPPORTED_PROVIDER", false, LogLevel::Warn),
        AppError::ProviderDisabled(_) => (400, "PROVIDER_DISABLED", false, LogLevel::Warn),
        AppError::MissingFileId => (400, "MISSING_FILE_ID", false, LogLevel::Debug),
        AppError::Unauthorized(_) => (401, "UNAUTHORIZED", false, LogLevel::Debug),
        AppError::BadRequest(_) => (400, "BAD_REQUEST", false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::FileSizeExceedsLimit { .. } => {
            (413, "FILE_SIZE_EXCEEDS_LIMIT", false, LogLevel::Debug)
        }
        AppError::Storage(_) => (500, "STORAGE_ERROR", true, LogLevel::Error),
        AppError::Database(_) => (500, "DATABASE_ERROR", true, LogLevel::Error),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", true, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::NoOrganizationId => "NoOrganizationId",
            AppError::ProviderResolutionFailed => "ProviderResolutionFailed",
            AppError::UnsupportedProvider(_) => "UnsupportedProvider",
            AppError::ProviderDisabled(_) => "ProviderDisabled",
            AppError::MissingFileId => "MissingFileId",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::FileSizeExceedsLimit { .. } => "FileSizeExceedsLimit",
            AppError::Storage(_) => "Storage",
            AppError::Database(_) => "Database",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        static_metadata(self).1
    }

    fn is_sensitive(&self) -> bool {
        static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::NoOrganizationId => "No organization in request context".to_string(),
            AppError::ProviderResolutionFailed => "Storage is unavailable".to_string(),
            AppError::UnsupportedProvider(ref p) => format!("Unsupported storage provider: {}", p),
            AppError::ProviderDisabled(ref p) => format!("Storage provider disabled: {}", p),
            AppError::MissingFileId => "File has no stable identifier".to_string(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::FileSizeExceedsLimit { size, limit } => {
                format!("File size {} exceeds limit of {} bytes", size, limit)
            }
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_unauthorized() {
        let err = AppError::Unauthorized("token signature mismatch".to_string());
        assert_eq!(err.http_status_code(), 401);
        assert_eq!(err.error_code(), "UNAUTHORIZED");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_resolution_failed() {
        let err = AppError::ProviderResolutionFailed;
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "PROVIDER_RESOLUTION_FAILED");
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Storage is unavailable");
    }

    #[test]
    fn test_error_metadata_size_limit() {
        let err = AppError::FileSizeExceedsLimit {
            size: 2048,
            limit: 1024,
        };
        assert_eq!(err.http_status_code(), 413);
        assert!(err.client_message().contains("2048"));
        assert!(err.client_message().contains("1024"));
    }
}
