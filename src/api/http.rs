//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rest::{catalog, charts, working_set};
use super::sse::handler as sse;
use super::state::AppState;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Catalog
        .route("/api/classes", get(catalog::list_classes))
        .route("/api/scenarios", get(catalog::list_scenarios))
        // Generation and working set
        .route("/api/generate", post(sse::generate))
        .route("/api/working-set", get(working_set::get_working_set))
        .route("/api/working-set/stream", get(sse::working_set_stream))
        .route("/api/export", get(working_set::export_working_set))
        // Charts
        .route("/api/charts", get(charts::get_charts))
        .route("/api/aggregate", post(charts::aggregate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::generation::SyntheticGenerator;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    fn app() -> (Router, Arc<AppState>) {
        let config = Config {
            chunk_size: 50,
            max_records: 500,
            seed: Some(7),
            ..Config::default()
        };
        let state = Arc::new(AppState::from_config(&config, Arc::new(SyntheticGenerator)));
        (create_router(Arc::clone(&state)), state)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn test_classes_are_grouped() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/api/classes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(value["data"][0]["category"], "System Activity [1]");
        assert_eq!(value["sequence_id"], 0);
    }

    #[tokio::test]
    async fn test_generate_streams_until_completed() {
        let (app, state) = app();
        let response = app
            .oneshot(post_json("/api/generate", r#"{"classUid": 3002, "count": 120}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("event: progress"));
        assert!(body.contains("event: completed"));
        assert_eq!(state.pipeline.working_set().current().records.len(), 120);
    }

    #[tokio::test]
    async fn test_generate_rejects_invalid_requests() {
        let (app, _) = app();
        let response = app
            .clone()
            .oneshot(post_json("/api/generate", r#"{"classUid": 9999, "count": 10}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_json("/api/generate", r#"{"scenarioId": "phishing", "count": 501}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(value["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_export_empty_working_set_is_not_found() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/api/export").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_after_generation() {
        let (app, _) = app();
        let response = app
            .clone()
            .oneshot(post_json("/api/generate", r#"{"scenarioId": "ransomware", "count": 25}"#))
            .await
            .unwrap();
        body_text(response).await;

        let response = app
            .oneshot(Request::builder().uri("/api/export").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"ocsf_scenario_ransomware_25_events.json\""
        );
        let records: Vec<Value> = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(records.len(), 25);
    }

    #[tokio::test]
    async fn test_aggregate_null_and_batch() {
        let (app, _) = app();
        let response = app
            .clone()
            .oneshot(post_json("/api/aggregate", "null"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "{}");

        let batch = r#"[
            {"time": 1709287200000, "severity": "High", "category_name": "Findings", "class_uid": 2004,
             "actor": {"user": {"name": "alice"}}}
        ]"#;
        let response = app.oneshot(post_json("/api/aggregate", batch)).await.unwrap();
        let value: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(value["categoryChart"]["labels"][0], "Findings");
        assert_eq!(value["topUsersChart"]["labels"][0], "alice");
        assert_eq!(value["heatmapData"].as_array().unwrap().len(), 168);
    }

    #[tokio::test]
    async fn test_aggregate_accepts_numeric_severity() {
        let (app, _) = app();
        let batch = r#"[
            {"time": 1709287200000, "severity": 4, "category_name": "Findings"},
            {"time": 1709287200000, "severity": "Low", "class_uid": 2004}
        ]"#;
        let response = app.oneshot(post_json("/api/aggregate", batch)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let value: Value = serde_json::from_str(&body_text(response).await).unwrap();
        let datasets = value["severityChart"]["datasets"].as_array().unwrap();
        let unknown = datasets.iter().find(|d| d["label"] == "Unknown").unwrap();
        assert_eq!(unknown["data"], serde_json::json!([1]));
    }

    #[tokio::test]
    async fn test_charts_before_any_generation() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/api/charts").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(value["ticket"].is_null());
        assert_eq!(value["charts"], serde_json::json!({}));
    }
}
