//! SSE handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::WatchStream;
use tracing::info;

use crate::api::rest::{ApiError, ApiFailure};
use crate::api::state::AppState;
use crate::types::{GenerationRequest, WireRequest};

/// POST /api/generate - Stream a generation request's progress
///
/// Closing the connection cancels the request.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(wire): Json<WireRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiFailure> {
    let request = GenerationRequest::try_from(wire)
        .and_then(|request| request.ensure_within(state.max_records).map(|_| request))
        .map_err(|e| ApiError::from(e).with_status(StatusCode::BAD_REQUEST))?;

    info!(count = request.record_count(), "Generation requested over HTTP");

    let stream = state.pipeline.generate(request).map(|event| {
        Ok(Event::default()
            .event(event.name())
            .data(serde_json::to_string(&event).unwrap_or_default()))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// GET /api/working-set/stream - Working-set publications
pub async fn working_set_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = WatchStream::new(state.pipeline.working_set().subscribe());
    let stream = updates.map(|snapshot| {
        Ok(Event::default()
            .event("working_set")
            .data(serde_json::to_string(&snapshot.summary()).unwrap_or_default()))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
