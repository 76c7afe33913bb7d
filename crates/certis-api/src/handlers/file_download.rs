//! Presigned download redemption for database-held files.
//!
//! `GET /v1/files/{id}/download?token=...` verifies the platform-issued
//! token, checks the caller against the identities bound into it, confirms
//! the persisted record matches the token's object URI, and streams the
//! bytes back.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Extension,
};
use certis_core::models::{File, FileMetadata, ProviderHints};
use certis_core::{AppError, AuthContext, ProviderType};
use certis_db::FileRecord;
use certis_services::object_uri::parse_object_uri;
use certis_services::tokens::{split_wire, DownloadToken};
use certis_storage::DownloadFileOptions;
use serde::Deserialize;
use std::sync::Arc;
use ulid::Ulid;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub token: String,
}

#[tracing::instrument(skip(state, query, caller), fields(operation = "file_download", file_id = %file_id))]
pub async fn database_file_download(
    Path(file_id): Path<String>,
    Query(query): Query<DownloadQuery>,
    State(state): State<Arc<AppState>>,
    caller: Option<Extension<AuthContext>>,
) -> Result<Response, HttpAppError> {
    let file_id = file_id.trim().to_string();
    if file_id.is_empty() {
        return Err(AppError::BadRequest("missing file id".to_string()).into());
    }

    let encoded_token = query.token.trim();
    if encoded_token.is_empty() {
        return Err(AppError::BadRequest("missing download token".to_string()).into());
    }

    let token = verify_download_token(&state, encoded_token)?;

    let caller = caller.map(|Extension(auth)| auth);
    validate_token_authorization(caller.as_ref(), &token)?;

    let (provider_type, bucket, key) = parse_object_uri(&token.object_uri)?;

    let record = state
        .files
        .get(&file_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("file {file_id}")))?;

    validate_file_metadata(&record, provider_type, &bucket, &key, &file_id)?;

    let file = build_storage_file(&record, &file_id);
    let auth = caller.unwrap_or_default();

    // no provider is passed: the file's known-provider hint carries what the
    // token already proved
    let download = state
        .storage
        .download(&auth, None, &file, &DownloadFileOptions::default())
        .await?;

    let content_type = if download.content_type.is_empty() {
        "application/octet-stream".to_string()
    } else {
        download.content_type.clone()
    };

    let mut file_name = download.name.clone();
    if file_name.is_empty() {
        file_name = record.provided_file_name.clone();
    }
    if file_name.is_empty() {
        file_name = file_id.clone();
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .body(Body::from(download.data))
        .map_err(|e| HttpAppError(AppError::Internal(e.to_string())))
}

/// Decode and authenticate the wire token. Every failure is a 401; the
/// response never distinguishes which check tripped.
fn verify_download_token(state: &AppState, encoded: &str) -> Result<DownloadToken, HttpAppError> {
    let unauthorized = || HttpAppError(AppError::Unauthorized("invalid download token".to_string()));

    let (signature, payload) = split_wire(encoded).map_err(|_| unauthorized())?;

    let token = DownloadToken::decode_payload(payload).map_err(|_| unauthorized())?;

    let secret = state
        .storage
        .lookup_download_secret(token.token_id)
        .ok_or_else(unauthorized)?;

    token.verify(signature, &secret).map_err(|_| unauthorized())?;

    Ok(token)
}

fn validate_token_authorization(
    caller: Option<&AuthContext>,
    token: &DownloadToken,
) -> Result<(), HttpAppError> {
    let unauthorized =
        || HttpAppError(AppError::Unauthorized("download not permitted".to_string()));

    if let Some(token_user) = token.user_id {
        let caller = caller.ok_or_else(unauthorized)?;

        let subject = caller
            .subject_id
            .parse::<Ulid>()
            .map_err(|_| unauthorized())?;
        if subject != token_user {
            return Err(unauthorized());
        }

        if let Some(token_org) = token.organization_id {
            if !caller.in_organization(&token_org.to_string()) {
                return Err(unauthorized());
            }
        }
    }

    Ok(())
}

/// The persisted record must agree with the token's object URI.
fn validate_file_metadata(
    record: &FileRecord,
    provider_type: ProviderType,
    bucket: &str,
    key: &str,
    file_id: &str,
) -> Result<(), HttpAppError> {
    let unauthorized = || {
        HttpAppError(AppError::Unauthorized(
            "token does not match stored file".to_string(),
        ))
    };

    if provider_type.as_str() != record.storage_provider {
        return Err(unauthorized());
    }

    if bucket != record.storage_volume {
        return Err(unauthorized());
    }

    let expected_key = if record.storage_path.is_empty() {
        file_id
    } else {
        record.storage_path.as_str()
    };

    if key != expected_key {
        return Err(unauthorized());
    }

    Ok(())
}

fn build_storage_file(record: &FileRecord, file_id: &str) -> File {
    let provider_type = record
        .storage_provider
        .parse::<ProviderType>()
        .unwrap_or(ProviderType::Database);

    let key = if record.storage_path.is_empty() {
        file_id.to_string()
    } else {
        record.storage_path.clone()
    };

    File {
        id: file_id.to_string(),
        original_name: record.provided_file_name.clone(),
        content_type: record.detected_content_type.clone(),
        field_name: String::new(),
        metadata: FileMetadata {
            key,
            bucket: record.storage_volume.clone(),
            size: record.size,
            content_type: record.detected_content_type.clone(),
            provider_type: Some(provider_type),
            hints: Some(ProviderHints {
                known_provider: Some(provider_type),
                organization_id: record.organization_id.clone(),
                ..Default::default()
            }),
        },
    }
}
