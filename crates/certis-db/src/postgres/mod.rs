//! Postgres repositories.

mod blob;
mod file;
mod integration;

pub use blob::PgBlobStore;
pub use file::PgFileStore;
pub use integration::PgIntegrationStore;

use certis_core::AppError;

pub(crate) fn db_error(err: sqlx::Error) -> AppError {
    AppError::Database(err.to_string())
}
