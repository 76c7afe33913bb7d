//! Multipart upload entrypoint.

use crate::auth::Caller;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use certis_core::models::{File, FileMetadata};
use certis_core::{AppError, ProviderType};
use certis_db::NewFileRecord;
use certis_storage::{
    detect_content_type, LimitedReader, ObjectReader, UploadFileOptions,
};
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub size: i64,
    pub provider: String,
    pub bucket: String,
    pub key: String,
}

#[tracing::instrument(skip(state, auth, multipart), fields(operation = "file_upload", org_id = %auth.0.organization_id))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    auth: Caller,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), HttpAppError> {
    let Caller(auth) = auth;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
        .ok_or_else(|| AppError::BadRequest("request carries no file part".to_string()))?;

    let field_name = field.name().unwrap_or("uploads").to_string();
    let file_name = field
        .file_name()
        .map(str::to_string)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest("file part needs a file name".to_string()))?;
    let declared_type = field.content_type().map(str::to_string).unwrap_or_default();

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("failed to read file part: {e}")))?;

    let content_type = if declared_type.is_empty()
        || declared_type.eq_ignore_ascii_case("application/octet-stream")
    {
        detect_content_type(&data).to_string()
    } else {
        declared_type
    };

    let mut file = File {
        original_name: file_name.clone(),
        content_type: content_type.clone(),
        field_name,
        metadata: FileMetadata {
            size: data.len() as i64,
            content_type: content_type.clone(),
            ..Default::default()
        },
        ..Default::default()
    };
    file.populate_hints(&auth.organization_id);

    let record = state
        .files
        .create(NewFileRecord {
            provided_file_name: file_name.clone(),
            detected_content_type: content_type.clone(),
            organization_id: auth.organization_id.clone(),
        })
        .await?;

    let reader: ObjectReader = match state.storage.max_upload_size() {
        Some(max) => Box::pin(LimitedReader::new(Cursor::new(data), max)),
        None => Box::pin(Cursor::new(data)),
    };

    let opts = UploadFileOptions {
        file_name,
        content_type,
        hints: file.metadata.hints.clone(),
        ..Default::default()
    };

    let uploaded = state.storage.upload(&auth, reader, &opts).await?;

    let provider = uploaded
        .metadata
        .provider_type
        .unwrap_or(ProviderType::Database);

    state
        .files
        .update_storage_metadata(
            &record.id,
            provider,
            &uploaded.metadata.bucket,
            &uploaded.metadata.key,
            uploaded.metadata.size,
            &uploaded.metadata.content_type,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FileResponse {
            id: record.id,
            name: uploaded.original_name,
            content_type: uploaded.metadata.content_type,
            size: uploaded.metadata.size,
            provider: provider.to_string(),
            bucket: uploaded.metadata.bucket,
            key: uploaded.metadata.key,
        }),
    ))
}
