//! Application layer - key lifecycle and validation use cases

pub mod api_keys;

pub use api_keys::{ApiKeyService, KeyCheck, KeyGenerator, RandomKeyGenerator, ValidationError};
