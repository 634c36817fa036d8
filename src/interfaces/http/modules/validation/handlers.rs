//! Key validation handler

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use super::dto::{ValidateKeyRequest, ValidateKeyResponse};
use crate::application::{ApiKeyService, KeyCheck, ValidationError};
use crate::interfaces::http::common::{error_response, ApiResponse, ErrorResponse};
use crate::interfaces::http::middleware::API_KEY_HEADER;
use crate::interfaces::http::modules::api_keys::dto::ApiKeyDto;

#[derive(Clone)]
pub struct ValidationState {
    pub service: Arc<ApiKeyService>,
}

/// Pick the presented key: body `apiKey` first, then the `x-api-key` header.
/// An empty body is allowed when the header carries the key.
fn presented_key(headers: &HeaderMap, body: &[u8]) -> Result<Option<String>, ErrorResponse> {
    let from_body = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<ValidateKeyRequest>(body)
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e)))?
            .api_key
    };

    Ok(from_body.or_else(|| {
        headers
            .get(API_KEY_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(String::from)
    }))
}

/// Validate an API key
#[utoipa::path(
    post,
    path = "/api/v1/validate-key",
    tag = "Validation",
    request_body = ValidateKeyRequest,
    responses(
        (status = 200, description = "Valid API key", body = ApiResponse<ValidateKeyResponse>),
        (status = 400, description = "API key is required"),
        (status = 401, description = "Invalid API key"),
        (status = 429, description = "Too many validation attempts"),
        (status = 500, description = "Error validating API key")
    )
)]
pub async fn validate_key(
    State(state): State<ValidationState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<ValidateKeyResponse>>, ErrorResponse> {
    let candidate = presented_key(&headers, &body)?;

    match state.service.validate(candidate.as_deref()).await {
        Ok(KeyCheck::Valid(key)) => Ok(Json(ApiResponse::success(ValidateKeyResponse {
            message: "Valid API key".to_string(),
            key: ApiKeyDto::revealed(key),
        }))),
        Ok(KeyCheck::Invalid) => Err(error_response(StatusCode::UNAUTHORIZED, "Invalid API key")),
        Err(e @ ValidationError::MissingKey) => {
            Err(error_response(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e @ ValidationError::Datastore(_)) => {
            Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_header(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        headers
    }

    #[test]
    fn test_body_takes_precedence_over_header() {
        let key = presented_key(&with_header("from-header"), br#"{"apiKey":"from-body"}"#).unwrap();
        assert_eq!(key.as_deref(), Some("from-body"));
    }

    #[test]
    fn test_header_used_when_body_empty() {
        let key = presented_key(&with_header("from-header"), b"").unwrap();
        assert_eq!(key.as_deref(), Some("from-header"));

        let key = presented_key(&with_header("from-header"), b"{}").unwrap();
        assert_eq!(key.as_deref(), Some("from-header"));
    }

    #[test]
    fn test_snake_case_alias_and_missing() {
        let key = presented_key(&HeaderMap::new(), br#"{"api_key":"k"}"#).unwrap();
        assert_eq!(key.as_deref(), Some("k"));
        assert!(presented_key(&HeaderMap::new(), b"").unwrap().is_none());
    }

    #[test]
    fn test_malformed_body_is_bad_request() {
        let (status, _) = presented_key(&HeaderMap::new(), b"{apiKey").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
