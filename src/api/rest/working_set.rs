//! Working-set endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::error;

use super::{ApiError, ApiFailure};
use crate::api::state::AppState;
use crate::export::{export_file_name, export_json, FALLBACK_FILE_NAME};

/// GET /api/working-set - Summary of the current working set
pub async fn get_working_set(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.pipeline.working_set().current().summary())
}

/// GET /api/export - Current working set as a JSON attachment
pub async fn export_working_set(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiFailure> {
    let snapshot = state.pipeline.working_set().current();
    if snapshot.is_empty() {
        return Err(ApiError::not_found("No events to export").with_status(StatusCode::NOT_FOUND));
    }

    let body = export_json(&snapshot.records).map_err(|e| {
        error!("Failed to serialize working set: {}", e);
        ApiError::internal(e.to_string()).with_status(StatusCode::INTERNAL_SERVER_ERROR)
    })?;

    let file_name = snapshot
        .origin
        .as_ref()
        .map(export_file_name)
        .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    ))
}
