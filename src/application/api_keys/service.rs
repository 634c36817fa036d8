//! API key service
//!
//! Lifecycle operations (list, create, rename, delete) and key validation
//! on top of an [`ApiKeyRepository`].

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::generator::{KeyGenerator, RandomKeyGenerator};
use crate::domain::{ApiKey, ApiKeyRepository, DomainError, DomainResult, NewApiKey};

/// How many tokens to mint before giving up on a unique one
const MAX_MINT_ATTEMPTS: u32 = 5;

/// Outcome of looking up a presented key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyCheck {
    /// The key exists; the record carries the freshly stamped `last_used`
    Valid(ApiKey),
    /// No record holds this key
    Invalid,
}

impl KeyCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, KeyCheck::Valid(_))
    }

    pub fn into_key(self) -> Option<ApiKey> {
        match self {
            KeyCheck::Valid(key) => Some(key),
            KeyCheck::Invalid => None,
        }
    }
}

/// Validation failures other than an unknown key
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("API key is required")]
    MissingKey,

    #[error("Error validating API key")]
    Datastore(#[source] DomainError),
}

pub struct ApiKeyService {
    repo: Arc<dyn ApiKeyRepository>,
    generator: Arc<dyn KeyGenerator>,
}

impl ApiKeyService {
    pub fn new(repo: Arc<dyn ApiKeyRepository>) -> Self {
        Self::with_generator(repo, Arc::new(RandomKeyGenerator))
    }

    pub fn with_generator(repo: Arc<dyn ApiKeyRepository>, generator: Arc<dyn KeyGenerator>) -> Self {
        Self { repo, generator }
    }

    /// All keys, newest first
    pub async fn list(&self) -> DomainResult<Vec<ApiKey>> {
        self.repo.list().await
    }

    /// Mint a token for `name` and persist it.
    ///
    /// A token that collides with an existing key is discarded and a new one
    /// minted, up to [`MAX_MINT_ATTEMPTS`] times.
    pub async fn create(&self, name: &str) -> DomainResult<ApiKey> {
        for attempt in 1..=MAX_MINT_ATTEMPTS {
            let token = self.generator.generate();
            match self.repo.insert(NewApiKey::new(name, token)).await {
                Ok(created) => {
                    info!(key_id = %created.id, name = %created.name, "API key created");
                    return Ok(created);
                }
                Err(DomainError::Conflict(_)) => {
                    warn!(attempt, "Minted API key collides with an existing key, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(DomainError::Conflict(format!(
            "could not mint a unique API key after {} attempts",
            MAX_MINT_ATTEMPTS
        )))
    }

    /// Change the display name. The token and creation time stay untouched.
    pub async fn rename(&self, id: &str, name: &str) -> DomainResult<ApiKey> {
        let renamed = self
            .repo
            .rename(id, name)
            .await?
            .ok_or_else(|| DomainError::api_key_not_found(id))?;

        info!(key_id = %id, name = %name, "API key renamed");
        Ok(renamed)
    }

    /// Remove the key permanently
    pub async fn delete(&self, id: &str) -> DomainResult<()> {
        if !self.repo.delete(id).await? {
            return Err(DomainError::api_key_not_found(id));
        }

        info!(key_id = %id, "API key deleted");
        Ok(())
    }

    /// Check a presented key and stamp its `last_used` time.
    ///
    /// Absent or blank input is `MissingKey`; an unknown key is
    /// `KeyCheck::Invalid`. Failing to stamp `last_used` is logged and does
    /// not change the outcome.
    pub async fn validate(&self, candidate: Option<&str>) -> Result<KeyCheck, ValidationError> {
        // Blank input is missing; anything else is looked up verbatim
        let Some(candidate) = candidate.filter(|s| !s.trim().is_empty()) else {
            record_validation("missing");
            return Err(ValidationError::MissingKey);
        };

        let found = self.repo.find_by_key(candidate).await.map_err(|e| {
            error!(error = %e, "Database error while validating API key");
            record_validation("error");
            ValidationError::Datastore(e)
        })?;

        let Some(mut key) = found else {
            debug!("Presented API key not found");
            record_validation("invalid");
            return Ok(KeyCheck::Invalid);
        };

        let now = Utc::now();
        match self.repo.touch_last_used(&key.id, now).await {
            Ok(()) => key.last_used = Some(now),
            Err(e) => warn!(key_id = %key.id, error = %e, "Error updating last_used timestamp"),
        }

        record_validation("valid");
        Ok(KeyCheck::Valid(key))
    }

    /// Datastore reachability, for health checks
    pub async fn ping(&self) -> DomainResult<()> {
        self.repo.ping().await
    }
}

fn record_validation(outcome: &'static str) {
    metrics::counter!("api_key_validations_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::infrastructure::storage::testing::FlakyApiKeyRepository;
    use crate::infrastructure::storage::InMemoryApiKeyRepository;

    /// Hands out a fixed sequence of tokens, then repeats the last one
    struct SequenceGenerator(Mutex<Vec<&'static str>>);

    impl SequenceGenerator {
        fn new(tokens: &[&'static str]) -> Self {
            let mut tokens = tokens.to_vec();
            tokens.reverse();
            Self(Mutex::new(tokens))
        }
    }

    impl KeyGenerator for SequenceGenerator {
        fn generate(&self) -> String {
            let mut tokens = self.0.lock().unwrap();
            if tokens.len() > 1 {
                tokens.pop().unwrap().to_string()
            } else {
                tokens[0].to_string()
            }
        }
    }

    fn service() -> ApiKeyService {
        ApiKeyService::new(Arc::new(InMemoryApiKeyRepository::new()))
    }

    fn is_minted_format(key: &str) -> bool {
        key.strip_prefix("key-number-")
            .map(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(false)
    }

    #[tokio::test]
    async fn test_create_mints_key_with_name() {
        let service = service();
        let created = service.create("Test").await.unwrap();

        assert_eq!(created.name, "Test");
        assert!(is_minted_format(&created.key), "bad key {}", created.key);
        assert!(created.last_used.is_none());
    }

    #[tokio::test]
    async fn test_create_retries_on_collision() {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let generator = Arc::new(SequenceGenerator::new(&[
            "key-number-111111",
            "key-number-111111",
            "key-number-222222",
        ]));
        let service = ApiKeyService::with_generator(repo, generator);

        let first = service.create("first").await.unwrap();
        let second = service.create("second").await.unwrap();

        assert_eq!(first.key, "key-number-111111");
        assert_eq!(second.key, "key-number-222222");
    }

    #[tokio::test]
    async fn test_create_gives_up_after_repeated_collisions() {
        let repo = Arc::new(InMemoryApiKeyRepository::new());
        let generator = Arc::new(SequenceGenerator::new(&["key-number-333333"]));
        let service = ApiKeyService::with_generator(repo, generator);

        service.create("first").await.unwrap();
        let err = service.create("second").await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_validate_unknown_key_is_invalid() {
        let service = service();
        service.create("Test").await.unwrap();

        let check = service.validate(Some("key-number-not-there")).await.unwrap();
        assert_eq!(check, KeyCheck::Invalid);
        assert!(!check.is_valid());
    }

    #[tokio::test]
    async fn test_validate_missing_key_is_distinct_error() {
        let service = service();

        assert!(matches!(service.validate(None).await, Err(ValidationError::MissingKey)));
        assert!(matches!(service.validate(Some("")).await, Err(ValidationError::MissingKey)));
        assert!(matches!(service.validate(Some("   ")).await, Err(ValidationError::MissingKey)));
    }

    #[tokio::test]
    async fn test_validate_padded_key_is_invalid() {
        let service = service();
        let created = service.create("Test").await.unwrap();

        let padded = format!("  {}\t", created.key);
        let check = service.validate(Some(&padded)).await.unwrap();
        assert_eq!(check, KeyCheck::Invalid);

        let stored = service.list().await.unwrap();
        assert!(stored[0].last_used.is_none());
    }

    #[tokio::test]
    async fn test_validate_stamps_last_used() {
        let service = service();
        let created = service.create("Test").await.unwrap();

        let before = Utc::now();
        let check = service.validate(Some(&created.key)).await.unwrap();
        let key = check.into_key().expect("key should be valid");

        assert_eq!(key.id, created.id);
        assert!(key.last_used.unwrap() >= before);

        let stored = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|k| k.id == created.id)
            .unwrap();
        assert!(stored.last_used.unwrap() >= before);
    }

    #[tokio::test]
    async fn test_validate_survives_failed_timestamp_update() {
        let repo = Arc::new(FlakyApiKeyRepository::new());
        let service = ApiKeyService::new(repo.clone());
        let created = service.create("Test").await.unwrap();

        repo.fail_touch(true);
        let check = service.validate(Some(&created.key)).await.unwrap();

        let key = check.into_key().expect("key should still be valid");
        assert!(key.last_used.is_none());
    }

    #[tokio::test]
    async fn test_validate_reports_datastore_error() {
        let repo = Arc::new(FlakyApiKeyRepository::new());
        let service = ApiKeyService::new(repo.clone());

        repo.fail_reads(true);
        let result = service.validate(Some("key-number-123456")).await;
        assert!(matches!(result, Err(ValidationError::Datastore(_))));
    }

    #[tokio::test]
    async fn test_rename_changes_name_only() {
        let service = service();
        let created = service.create("Before").await.unwrap();

        let renamed = service.rename(&created.id, "After").await.unwrap();
        assert_eq!(renamed.name, "After");
        assert_eq!(renamed.key, created.key);
        assert_eq!(renamed.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_rename_unknown_id_is_not_found() {
        let err = service().rename("missing", "x").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_then_list_omits_key() {
        let service = service();
        let keep = service.create("keep").await.unwrap();
        let gone = service.create("gone").await.unwrap();

        service.delete(&gone.id).await.unwrap();

        let ids: Vec<String> = service.list().await.unwrap().into_iter().map(|k| k.id).collect();
        assert_eq!(ids, vec![keep.id]);

        assert!(service.delete(&gone.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let service = service();
        for name in ["a", "b", "c"] {
            service.create(name).await.unwrap();
        }

        let keys = service.list().await.unwrap();
        assert_eq!(keys.len(), 3);
        assert!(keys.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }
}
