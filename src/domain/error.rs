use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl DomainError {
    pub fn api_key_not_found(id: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity: "API key",
            field: "id",
            value: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
