//! Response envelope

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Standard API response wrapper
///
/// Success: `{"success": true, "data": {...}}`,
/// failure: `{"success": false, "data": null, "error": "..."}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    /// Payload, `null` on failure
    pub data: Option<T>,
    /// Error description, omitted on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error half of every handler result
pub type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (status, Json(ApiResponse::error(message)))
}

/// Map a domain error to an HTTP error.
///
/// Datastore details are logged and replaced by `fallback`.
pub fn domain_error_response(e: DomainError, fallback: &str) -> ErrorResponse {
    match e {
        DomainError::NotFound { entity, .. } => {
            error_response(StatusCode::NOT_FOUND, format!("{} not found", entity))
        }
        DomainError::Conflict(msg) => {
            error!("Conflict: {}", msg);
            error_response(StatusCode::CONFLICT, fallback)
        }
        DomainError::Database(msg) => {
            error!("Database error: {}", msg);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, fallback)
        }
    }
}
