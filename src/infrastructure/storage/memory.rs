//! In-memory ApiKeyRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{ApiKey, ApiKeyRepository, DomainError, DomainResult, NewApiKey};

/// In-memory key store for development and testing.
///
/// Selected with `database.url = "memory://"`; contents are lost on restart.
pub struct InMemoryApiKeyRepository {
    keys: DashMap<String, ApiKey>,
    /// token -> id, enforces token uniqueness
    tokens: DashMap<String, String>,
}

impl InMemoryApiKeyRepository {
    pub fn new() -> Self {
        Self {
            keys: DashMap::new(),
            tokens: DashMap::new(),
        }
    }
}

impl Default for InMemoryApiKeyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApiKeyRepository for InMemoryApiKeyRepository {
    async fn list(&self) -> DomainResult<Vec<ApiKey>> {
        let mut keys: Vec<ApiKey> = self.keys.iter().map(|entry| entry.value().clone()).collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn find_by_key(&self, key: &str) -> DomainResult<Option<ApiKey>> {
        let Some(id) = self.tokens.get(key).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        Ok(self.keys.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, new_key: NewApiKey) -> DomainResult<ApiKey> {
        let id = uuid::Uuid::new_v4().to_string();
        match self.tokens.entry(new_key.key.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict("API key token".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
                let record = ApiKey {
                    id: id.clone(),
                    name: new_key.name,
                    key: new_key.key,
                    created_at: new_key.created_at,
                    last_used: None,
                };
                self.keys.insert(id, record.clone());
                Ok(record)
            }
        }
    }

    async fn rename(&self, id: &str, name: &str) -> DomainResult<Option<ApiKey>> {
        Ok(self.keys.get_mut(id).map(|mut entry| {
            entry.name = name.to_string();
            entry.clone()
        }))
    }

    async fn touch_last_used(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        if let Some(mut entry) = self.keys.get_mut(id) {
            entry.last_used = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        match self.keys.remove(id) {
            Some((_, record)) => {
                self.tokens.remove(&record.key);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }
}
