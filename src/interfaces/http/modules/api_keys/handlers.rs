//! API Key management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{ApiKeyDto, CreateApiKeyRequest, ListApiKeysParams, RenameApiKeyRequest};
use crate::application::ApiKeyService;
use crate::domain::ApiKey;
use crate::interfaces::http::common::{domain_error_response, ApiResponse, ErrorResponse, ValidatedJson};

/// API key handler state
#[derive(Clone)]
pub struct ApiKeyHandlerState {
    pub service: Arc<ApiKeyService>,
}

/// List API keys, newest first
#[utoipa::path(
    get,
    path = "/api/v1/api-keys",
    tag = "API Keys",
    security(("admin_token" = [])),
    params(ListApiKeysParams),
    responses(
        (status = 200, description = "List of API keys", body = ApiResponse<Vec<ApiKeyDto>>),
        (status = 401, description = "Missing or wrong admin token")
    )
)]
pub async fn list_api_keys(
    State(state): State<ApiKeyHandlerState>,
    Query(params): Query<ListApiKeysParams>,
) -> Result<Json<ApiResponse<Vec<ApiKeyDto>>>, ErrorResponse> {
    let keys = state
        .service
        .list()
        .await
        .map_err(|e| domain_error_response(e, "Failed to fetch API keys"))?;

    let to_dto: fn(ApiKey) -> ApiKeyDto = if params.reveal {
        ApiKeyDto::revealed
    } else {
        ApiKeyDto::masked
    };

    Ok(Json(ApiResponse::success(keys.into_iter().map(to_dto).collect())))
}

/// Create a new API key
#[utoipa::path(
    post,
    path = "/api/v1/api-keys",
    tag = "API Keys",
    security(("admin_token" = [])),
    request_body = CreateApiKeyRequest,
    responses(
        (status = 201, description = "API key created", body = ApiResponse<ApiKeyDto>),
        (status = 401, description = "Missing or wrong admin token"),
        (status = 422, description = "Blank or overlong name")
    )
)]
pub async fn create_api_key(
    State(state): State<ApiKeyHandlerState>,
    ValidatedJson(request): ValidatedJson<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ApiKeyDto>>), ErrorResponse> {
    let created = state
        .service
        .create(request.name.trim())
        .await
        .map_err(|e| domain_error_response(e, "Failed to create API key"))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ApiKeyDto::revealed(created))),
    ))
}

/// Rename an API key
#[utoipa::path(
    put,
    path = "/api/v1/api-keys/{id}",
    tag = "API Keys",
    security(("admin_token" = [])),
    params(("id" = String, Path, description = "API key ID")),
    request_body = RenameApiKeyRequest,
    responses(
        (status = 200, description = "API key renamed", body = ApiResponse<ApiKeyDto>),
        (status = 404, description = "API key not found"),
        (status = 422, description = "Blank or overlong name")
    )
)]
pub async fn rename_api_key(
    State(state): State<ApiKeyHandlerState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<RenameApiKeyRequest>,
) -> Result<Json<ApiResponse<ApiKeyDto>>, ErrorResponse> {
    let renamed = state
        .service
        .rename(&id, request.name.trim())
        .await
        .map_err(|e| domain_error_response(e, "Failed to update API key"))?;

    Ok(Json(ApiResponse::success(ApiKeyDto::masked(renamed))))
}

/// Delete an API key permanently
#[utoipa::path(
    delete,
    path = "/api/v1/api-keys/{id}",
    tag = "API Keys",
    security(("admin_token" = [])),
    params(("id" = String, Path, description = "API key ID")),
    responses(
        (status = 200, description = "API key deleted"),
        (status = 404, description = "API key not found")
    )
)]
pub async fn delete_api_key(
    State(state): State<ApiKeyHandlerState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ErrorResponse> {
    state
        .service
        .delete(&id)
        .await
        .map_err(|e| domain_error_response(e, "Failed to delete API key"))?;

    Ok(Json(ApiResponse::success(())))
}
