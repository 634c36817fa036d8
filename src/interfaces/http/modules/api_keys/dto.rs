//! API Key DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::domain::ApiKey;

/// Rejects names made only of whitespace
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "name": "Production" }))]
pub struct CreateApiKeyRequest {
    /// Display name for the new key
    #[validate(
        custom(function = "not_blank", message = "name is required"),
        length(max = 100, message = "name must be at most 100 characters")
    )]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "name": "Staging" }))]
pub struct RenameApiKeyRequest {
    #[validate(
        custom(function = "not_blank", message = "name is required"),
        length(max = 100, message = "name must be at most 100 characters")
    )]
    pub name: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListApiKeysParams {
    /// Include full key tokens instead of masked ones
    #[serde(default)]
    pub reveal: bool,
}

/// API key as returned by the management routes
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyDto {
    pub id: String,
    pub name: String,
    /// Full token; present on creation, validation, or `reveal=true`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Display form, e.g. `key-number-12•••••`
    pub masked_key: String,
    pub created_at: String,
    pub last_used: Option<String>,
}

impl ApiKeyDto {
    pub fn revealed(key: ApiKey) -> Self {
        let masked_key = key.masked_key();
        Self {
            id: key.id,
            name: key.name,
            key: Some(key.key),
            masked_key,
            created_at: key.created_at.to_rfc3339(),
            last_used: key.last_used.map(|t| t.to_rfc3339()),
        }
    }

    pub fn masked(key: ApiKey) -> Self {
        Self {
            key: None,
            ..Self::revealed(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_blank_names_rejected() {
        assert!(CreateApiKeyRequest { name: "  ".into() }.validate().is_err());
        assert!(RenameApiKeyRequest { name: "x".repeat(101) }.validate().is_err());
        assert!(CreateApiKeyRequest { name: "Test".into() }.validate().is_ok());
    }

    #[test]
    fn test_masked_dto_hides_token() {
        let key = ApiKey {
            id: "1".into(),
            name: "Test".into(),
            key: "key-number-987654".into(),
            created_at: Utc::now(),
            last_used: None,
        };

        let json = serde_json::to_value(ApiKeyDto::masked(key)).unwrap();
        assert!(json.get("key").is_none());
        assert_eq!(json["masked_key"], "key-number-98•••••");
    }
}
