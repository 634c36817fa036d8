//! ApiKey repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{ApiKey, NewApiKey};
use crate::domain::DomainResult;

#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// All keys, most recently created first.
    async fn list(&self) -> DomainResult<Vec<ApiKey>>;
    async fn find_by_key(&self, key: &str) -> DomainResult<Option<ApiKey>>;
    /// Persist a new key. A duplicate token yields `DomainError::Conflict`.
    async fn insert(&self, new_key: NewApiKey) -> DomainResult<ApiKey>;
    /// Returns `None` when no key has this id.
    async fn rename(&self, id: &str, name: &str) -> DomainResult<Option<ApiKey>>;
    async fn touch_last_used(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()>;
    /// Returns `false` when no key has this id.
    async fn delete(&self, id: &str) -> DomainResult<bool>;
    /// Round trip to the backing store, used by health checks.
    async fn ping(&self) -> DomainResult<()>;
}
