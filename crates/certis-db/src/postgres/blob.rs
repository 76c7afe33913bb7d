//! Blob repository backing the database storage provider.

use async_trait::async_trait;
use bytes::Bytes;
use certis_storage::providers::{BlobStore, StoredBlob};
use certis_storage::{StorageError, StorageResult};
use sqlx::{PgPool, Postgres};

/// Row type for the object_blobs table.
#[derive(Debug, sqlx::FromRow)]
struct BlobRow {
    data: Vec<u8>,
    size: i64,
    content_type: String,
    name: String,
}

#[derive(Clone)]
pub struct PgBlobStore {
    pool: PgPool,
}

impl PgBlobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn blob_error(err: sqlx::Error) -> StorageError {
    StorageError::BackendError(err.to_string())
}

#[async_trait]
impl BlobStore for PgBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
        name: &str,
    ) -> StorageResult<()> {
        let size = data.len() as i64;

        sqlx::query(
            r#"
            INSERT INTO object_blobs (bucket, key, data, size, content_type, name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (bucket, key)
            DO UPDATE SET data = EXCLUDED.data,
                          size = EXCLUDED.size,
                          content_type = EXCLUDED.content_type,
                          name = EXCLUDED.name
            "#,
        )
        .bind(bucket)
        .bind(key)
        .bind(data.as_ref())
        .bind(size)
        .bind(content_type)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(blob_error)?;

        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<Option<StoredBlob>> {
        let row: Option<BlobRow> = sqlx::query_as::<Postgres, BlobRow>(
            r#"
            SELECT data, size, content_type, name
            FROM object_blobs
            WHERE bucket = $1 AND key = $2
            "#,
        )
        .bind(bucket)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(blob_error)?;

        Ok(row.map(|row| StoredBlob {
            data: Bytes::from(row.data),
            size: row.size,
            content_type: row.content_type,
            name: row.name,
        }))
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        sqlx::query("DELETE FROM object_blobs WHERE bucket = $1 AND key = $2")
            .bind(bucket)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(blob_error)?;

        Ok(())
    }

    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        let found: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM object_blobs WHERE bucket = $1 AND key = $2",
        )
        .bind(bucket)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(blob_error)?;

        Ok(found.is_some())
    }
}
