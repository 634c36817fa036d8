//! ApiKey aggregate
//!
//! Contains the key record, its display rules, and the repository interface.

pub mod model;
pub mod repository;

pub use model::{ApiKey, NewApiKey, KEY_PREFIX};
pub use repository::ApiKeyRepository;
