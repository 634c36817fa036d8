//! Domain layer
//!
//! The `ApiKey` record, its repository port, and domain errors.

pub mod api_key;
pub mod error;

pub use api_key::{ApiKey, ApiKeyRepository, NewApiKey};
pub use error::{DomainError, DomainResult};
