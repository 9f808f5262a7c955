//! REST API module for HTTP endpoints
//!
//! - `GET /api/classes` - Class uids grouped by category
//! - `GET /api/scenarios` - Known attack scenarios
//! - `GET /api/working-set` - Summary of the current working set
//! - `GET /api/export` - Current working set as a JSON download
//! - `GET /api/charts` - Latest aggregation result
//! - `POST /api/aggregate` - Aggregate a posted batch

pub mod catalog;
pub mod charts;
pub mod working_set;

use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::error::RequestError;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Working-set sequence ID for cache invalidation
    pub sequence_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, sequence_id: u64) -> Self {
        Self {
            data,
            sequence_id,
            total: None,
        }
    }

    pub fn with_total(data: T, sequence_id: u64, total: usize) -> Self {
        Self {
            data,
            sequence_id,
            total: Some(total),
        }
    }
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

/// Error half of a handler result
pub type ApiFailure = (StatusCode, Json<ApiError>);

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "NOT_FOUND".to_string(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "BAD_REQUEST".to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "INTERNAL_ERROR".to_string(),
        }
    }

    pub fn with_status(self, status: StatusCode) -> ApiFailure {
        (status, Json(self))
    }
}

impl From<RequestError> for ApiError {
    fn from(e: RequestError) -> Self {
        ApiError::bad_request(e.to_string())
    }
}
