//! Key validation DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::interfaces::http::modules::api_keys::dto::ApiKeyDto;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[schema(example = json!({ "apiKey": "key-number-123456" }))]
pub struct ValidateKeyRequest {
    /// Key to check; the `x-api-key` header is used when absent
    #[serde(rename = "apiKey", alias = "api_key", default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateKeyResponse {
    pub message: String,
    /// The matched record, with `last_used` already stamped
    pub key: ApiKeyDto,
}
