//! Class and scenario catalog endpoints

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use super::ApiResponse;
use crate::api::state::AppState;
use crate::types::{class_groups, ScenarioId};

/// Scenario entry for selection lists
#[derive(Debug, Serialize)]
pub struct ScenarioEntry {
    pub id: &'static str,
    pub name: &'static str,
}

/// GET /api/classes - Class uids grouped by category
pub async fn list_classes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let groups = class_groups();
    let total = groups.iter().map(|g| g.classes.len()).sum();
    Json(ApiResponse::with_total(groups, state.current_sequence_id(), total))
}

/// GET /api/scenarios - Known scenarios
pub async fn list_scenarios(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let scenarios: Vec<ScenarioEntry> = ScenarioId::ALL
        .iter()
        .map(|s| ScenarioEntry {
            id: s.id(),
            name: s.name(),
        })
        .collect();
    Json(ApiResponse::new(scenarios, state.current_sequence_id()))
}
