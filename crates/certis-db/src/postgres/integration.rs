//! Integration + hush repository: system-owned provider configurations.

use super::db_error;
use crate::models::{Hush, NewSystemIntegration, SystemIntegration};
use crate::stores::IntegrationStore;
use async_trait::async_trait;
use certis_core::models::CredentialSet;
use certis_core::{AppError, AuthContext, ProviderType};
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use ulid::Ulid;

/// Row type for the integrations table.
#[derive(Debug, sqlx::FromRow)]
struct IntegrationRow {
    id: String,
    name: String,
    kind: String,
    system_owned: bool,
    metadata: serde_json::Value,
}

/// Row type for the hushes table.
#[derive(Debug, sqlx::FromRow)]
struct HushRow {
    id: String,
    name: String,
    kind: String,
    system_owned: bool,
    credential_set: serde_json::Value,
    integration_id: String,
}

impl HushRow {
    fn into_hush(self) -> Hush {
        Hush {
            id: self.id,
            name: self.name,
            kind: self.kind,
            system_owned: self.system_owned,
            credential_set: serde_json::from_value::<CredentialSet>(self.credential_set)
                .unwrap_or_default(),
        }
    }
}

#[derive(Clone)]
pub struct PgIntegrationStore {
    pool: PgPool,
}

impl PgIntegrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IntegrationStore for PgIntegrationStore {
    #[tracing::instrument(skip(self, _auth), fields(db.table = "integrations"))]
    async fn system_integrations(
        &self,
        _auth: &AuthContext,
        kind: ProviderType,
    ) -> Result<Vec<SystemIntegration>, AppError> {
        let rows: Vec<IntegrationRow> = sqlx::query_as::<Postgres, IntegrationRow>(
            r#"
            SELECT id, name, kind, system_owned, metadata
            FROM integrations
            WHERE kind = $1 AND system_owned = TRUE
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = rows.iter().map(|row| row.id.clone()).collect();

        let secret_rows: Vec<HushRow> = sqlx::query_as::<Postgres, HushRow>(
            r#"
            SELECT id, name, kind, system_owned, credential_set, integration_id
            FROM hushes
            WHERE integration_id = ANY($1) AND system_owned = TRUE
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut secrets_by_integration: HashMap<String, Vec<Hush>> = HashMap::new();
        for row in secret_rows {
            let integration_id = row.integration_id.clone();
            secrets_by_integration
                .entry(integration_id)
                .or_default()
                .push(row.into_hush());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let secrets = secrets_by_integration.remove(&row.id).unwrap_or_default();
                SystemIntegration {
                    metadata: serde_json::from_value(row.metadata).unwrap_or_default(),
                    id: row.id,
                    name: row.name,
                    kind: row.kind,
                    system_owned: row.system_owned,
                    secrets,
                }
            })
            .collect())
    }

    #[tracing::instrument(skip(self, auth, input), fields(db.table = "integrations"))]
    async fn create_system_integration(
        &self,
        auth: &AuthContext,
        input: NewSystemIntegration,
    ) -> Result<SystemIntegration, AppError> {
        if !auth.system_admin {
            return Err(AppError::Unauthorized(
                "system integrations are system-admin only".to_string(),
            ));
        }

        let integration_id = Ulid::new().to_string();
        let hush_id = Ulid::new().to_string();
        let kind = input.kind.as_str();
        let metadata =
            serde_json::to_value(&input.metadata).map_err(|e| AppError::Internal(e.to_string()))?;
        let credential_set = serde_json::to_value(&input.credential_set)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query(
            r#"
            INSERT INTO integrations (id, name, description, kind, system_owned, metadata)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            "#,
        )
        .bind(&integration_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(kind)
        .bind(&metadata)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        let hush_name = format!("{}_system_credentials", kind);

        sqlx::query(
            r#"
            INSERT INTO hushes (id, name, kind, system_owned, credential_set, integration_id)
            VALUES ($1, $2, $3, TRUE, $4, $5)
            "#,
        )
        .bind(&hush_id)
        .bind(&hush_name)
        .bind(kind)
        .bind(&credential_set)
        .bind(&integration_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        Ok(SystemIntegration {
            id: integration_id,
            name: input.name,
            kind: kind.to_string(),
            system_owned: true,
            metadata: input.metadata,
            secrets: vec![Hush {
                id: hush_id,
                name: hush_name,
                kind: kind.to_string(),
                system_owned: true,
                credential_set: input.credential_set,
            }],
        })
    }
}
