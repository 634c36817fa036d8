//! API key use cases

pub mod generator;
pub mod service;

pub use generator::{KeyGenerator, RandomKeyGenerator};
pub use service::{ApiKeyService, KeyCheck, ValidationError};
