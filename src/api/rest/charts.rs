//! Chart endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use super::{ApiError, ApiFailure};
use crate::api::state::AppState;
use crate::types::{AggregationReply, EventRecord};

/// Latest published aggregation
#[derive(Debug, Serialize)]
pub struct ChartsView {
    pub ticket: Option<u64>,
    pub record_count: usize,
    pub computed_at: Option<DateTime<Utc>>,
    pub charts: AggregationReply,
}

/// GET /api/charts - Latest aggregation result (`{}` charts when none)
pub async fn get_charts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let view = match state.pipeline.aggregation().latest() {
        Some(report) => ChartsView {
            ticket: Some(report.ticket),
            record_count: report.record_count,
            computed_at: Some(report.computed_at),
            charts: (*report.reply).clone(),
        },
        None => ChartsView {
            ticket: None,
            record_count: 0,
            computed_at: None,
            charts: AggregationReply::Empty,
        },
    };
    Json(view)
}

/// POST /api/aggregate - Aggregate a posted batch without publishing it
pub async fn aggregate(
    State(state): State<Arc<AppState>>,
    Json(records): Json<Option<Vec<EventRecord>>>,
) -> Result<Json<AggregationReply>, ApiFailure> {
    let records: Arc<[EventRecord]> = records.unwrap_or_default().into();
    state
        .pipeline
        .aggregation()
        .compute(records)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Aggregation task failed: {}", e);
            ApiError::internal("aggregation failed").with_status(StatusCode::INTERNAL_SERVER_ERROR)
        })
}
