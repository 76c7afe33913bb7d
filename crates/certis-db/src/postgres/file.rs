//! File record repository.

use super::db_error;
use crate::models::{FileRecord, NewFileRecord};
use crate::stores::FileStore;
use async_trait::async_trait;
use certis_core::{AppError, ProviderType};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use ulid::Ulid;

/// Row type for the files table.
#[derive(Debug, sqlx::FromRow)]
struct FileRow {
    id: String,
    provided_file_name: String,
    detected_content_type: String,
    storage_provider: String,
    storage_volume: String,
    storage_path: String,
    size: i64,
    organization_id: String,
    created_at: Option<DateTime<Utc>>,
}

impl FileRow {
    fn into_record(self) -> FileRecord {
        FileRecord {
            id: self.id,
            provided_file_name: self.provided_file_name,
            detected_content_type: self.detected_content_type,
            storage_provider: self.storage_provider,
            storage_volume: self.storage_volume,
            storage_path: self.storage_path,
            size: self.size,
            organization_id: self.organization_id,
            created_at: self.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgFileStore {
    pool: PgPool,
}

impl PgFileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for PgFileStore {
    #[tracing::instrument(skip(self), fields(db.table = "files"))]
    async fn get(&self, id: &str) -> Result<Option<FileRecord>, AppError> {
        let row: Option<FileRow> = sqlx::query_as::<Postgres, FileRow>(
            r#"
            SELECT id, provided_file_name, detected_content_type, storage_provider,
                   storage_volume, storage_path, size, organization_id, created_at
            FROM files
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.map(FileRow::into_record))
    }

    #[tracing::instrument(skip(self, input), fields(db.table = "files"))]
    async fn create(&self, input: NewFileRecord) -> Result<FileRecord, AppError> {
        let id = Ulid::new().to_string();

        let row: FileRow = sqlx::query_as::<Postgres, FileRow>(
            r#"
            INSERT INTO files (id, provided_file_name, detected_content_type, storage_provider,
                               storage_volume, storage_path, size, organization_id, created_at)
            VALUES ($1, $2, $3, '', '', '', 0, $4, NOW())
            RETURNING id, provided_file_name, detected_content_type, storage_provider,
                      storage_volume, storage_path, size, organization_id, created_at
            "#,
        )
        .bind(&id)
        .bind(&input.provided_file_name)
        .bind(&input.detected_content_type)
        .bind(&input.organization_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.into_record())
    }

    #[tracing::instrument(skip(self), fields(db.table = "files"))]
    async fn update_storage_metadata(
        &self,
        id: &str,
        provider: ProviderType,
        bucket: &str,
        key: &str,
        size: i64,
        content_type: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE files
            SET storage_provider = $2,
                storage_volume = $3,
                storage_path = $4,
                size = $5,
                detected_content_type = CASE WHEN $6 = '' THEN detected_content_type ELSE $6 END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(provider.as_str())
        .bind(bucket)
        .bind(key)
        .bind(size)
        .bind(content_type)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("file record {id}")));
        }

        Ok(())
    }
}
