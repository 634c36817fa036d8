//! Repository double with switchable failures

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::InMemoryApiKeyRepository;
use crate::domain::{ApiKey, ApiKeyRepository, DomainError, DomainResult, NewApiKey};

/// Wraps [`InMemoryApiKeyRepository`] and fails selected calls on demand
#[derive(Default)]
pub struct FlakyApiKeyRepository {
    inner: InMemoryApiKeyRepository,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_touch: AtomicBool,
}

impl FlakyApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_touch(&self, on: bool) {
        self.fail_touch.store(on, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> DomainResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(DomainError::Database("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ApiKeyRepository for FlakyApiKeyRepository {
    async fn list(&self) -> DomainResult<Vec<ApiKey>> {
        Self::check(&self.fail_reads)?;
        self.inner.list().await
    }

    async fn find_by_key(&self, key: &str) -> DomainResult<Option<ApiKey>> {
        Self::check(&self.fail_reads)?;
        self.inner.find_by_key(key).await
    }

    async fn insert(&self, new_key: NewApiKey) -> DomainResult<ApiKey> {
        Self::check(&self.fail_writes)?;
        self.inner.insert(new_key).await
    }

    async fn rename(&self, id: &str, name: &str) -> DomainResult<Option<ApiKey>> {
        Self::check(&self.fail_writes)?;
        self.inner.rename(id, name).await
    }

    async fn touch_last_used(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        Self::check(&self.fail_touch)?;
        self.inner.touch_last_used(id, at).await
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        Self::check(&self.fail_writes)?;
        self.inner.delete(id).await
    }

    async fn ping(&self) -> DomainResult<()> {
        Self::check(&self.fail_reads)
    }
}
