//! Route table for the storage endpoints.

use crate::handlers::{file_download, file_upload};
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/files", post(file_upload::upload_file))
        .route(
            "/v1/files/{id}/download",
            get(file_download::database_file_download),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
