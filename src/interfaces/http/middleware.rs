//! Authentication middleware for Axum
//!
//! - `admin_auth_middleware` guards the management routes with a static
//!   bearer token from `security.admin_token`.
//! - `api_key_middleware` guards key-protected resources with the
//!   `x-api-key` header, using the same validation as `/validate-key`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::application::{ApiKeyService, KeyCheck, ValidationError};
use crate::config::SecurityConfig;
use crate::domain::ApiKey;
use crate::interfaces::http::common::ApiResponse;

/// Header carrying a client API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Authentication failures, rendered as JSON error envelopes
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ManagementDisabled,
    MissingApiKey,
    InvalidApiKey,
    ValidationUnavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing admin token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid admin token"),
            AuthError::ManagementDisabled => (
                StatusCode::UNAUTHORIZED,
                "Management API is disabled: no admin token configured",
            ),
            AuthError::MissingApiKey => (StatusCode::BAD_REQUEST, "API key is required"),
            AuthError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Invalid API key"),
            AuthError::ValidationUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Error validating API key")
            }
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

/// State for the admin-token check. Only a digest of the token is kept.
#[derive(Clone)]
pub struct AdminAuthState {
    token_digest: Option<Vec<u8>>,
    allow_open: bool,
}

impl AdminAuthState {
    pub fn from_config(security: &SecurityConfig) -> Self {
        Self {
            token_digest: security
                .admin_token
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(digest),
            allow_open: security.allow_open_management,
        }
    }

    /// Whether requests pass without any token
    pub fn is_open(&self) -> bool {
        self.token_digest.is_none() && self.allow_open
    }

    fn check(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let Some(expected) = &self.token_digest else {
            return if self.allow_open {
                Ok(())
            } else {
                Err(AuthError::ManagementDisabled)
            };
        };

        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingToken)?
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        if digest(token.trim()) == *expected {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

fn digest(token: &str) -> Vec<u8> {
    Sha256::digest(token.as_bytes()).to_vec()
}

pub async fn admin_auth_middleware(
    State(state): State<AdminAuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Err(e) = state.check(request.headers()) {
        warn!(uri = %request.uri(), "Rejected management request: {:?}", e);
        return e.into_response();
    }
    next.run(request).await
}

/// The key a request was authenticated with, stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedKey(pub ApiKey);

#[derive(Clone)]
pub struct ApiKeyAuthState {
    pub service: Arc<ApiKeyService>,
}

pub async fn api_key_middleware(
    State(state): State<ApiKeyAuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(String::from);

    match state.service.validate(presented.as_deref()).await {
        Ok(KeyCheck::Valid(key)) => {
            request.extensions_mut().insert(AuthenticatedKey(key));
            next.run(request).await
        }
        Ok(KeyCheck::Invalid) => AuthError::InvalidApiKey.into_response(),
        Err(ValidationError::MissingKey) => AuthError::MissingApiKey.into_response(),
        Err(ValidationError::Datastore(_)) => AuthError::ValidationUnavailable.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(value) = auth {
            map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn state(token: Option<&str>, allow_open: bool) -> AdminAuthState {
        AdminAuthState::from_config(&SecurityConfig {
            admin_token: token.map(String::from),
            allow_open_management: allow_open,
        })
    }

    #[test]
    fn test_matching_bearer_token_passes() {
        let state = state(Some("s3cret"), false);
        assert!(state.check(&headers(Some("Bearer s3cret"))).is_ok());
    }

    #[test]
    fn test_wrong_or_missing_token_rejected() {
        let state = state(Some("s3cret"), false);
        assert!(matches!(state.check(&headers(None)), Err(AuthError::MissingToken)));
        assert!(matches!(
            state.check(&headers(Some("Bearer nope"))),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            state.check(&headers(Some("s3cret"))),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_no_token_configured() {
        assert!(matches!(
            state(None, false).check(&headers(None)),
            Err(AuthError::ManagementDisabled)
        ));
        assert!(matches!(
            state(Some(""), false).check(&headers(Some("Bearer "))),
            Err(AuthError::ManagementDisabled)
        ));

        let open = state(None, true);
        assert!(open.is_open());
        assert!(open.check(&headers(None)).is_ok());
    }
}
